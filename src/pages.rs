//! Full-page HTML shells.
//!
//! Each page is a static layout whose dynamic parts are HTMX fragments
//! fetched on load, on every `alerts-changed` SSE event, on the refresh
//! button and every 30 seconds. Embedded for single-binary deployment.

use crate::contact::{FaqAccordion, MESSAGE_LIMIT};
use crate::filters::{StatusFilter, TimeWindow};
use crate::map::{DEFAULT_VIEW, LeafletScript, MapAdapter, MapFocus};
use crate::render;

/// Top navigation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Map,
    Alerts,
    Contact,
}

impl Nav {
    const ALL: [Self; 3] = [Self::Map, Self::Alerts, Self::Contact];

    const fn href(self) -> &'static str {
        match self {
            Self::Map => "/map",
            Self::Alerts => "/alerts",
            Self::Contact => "/contact",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Map => "Live Map",
            Self::Alerts => "Recent Alerts",
            Self::Contact => "Support",
        }
    }
}

fn nav(active: Nav) -> String {
    Nav::ALL
        .iter()
        .map(|item| {
            let class = if *item == active { " class=\"active\"" } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, item.href(), item.label())
        })
        .collect::<Vec<_>>()
        .join("\n            ")
}

fn layout(title: &str, active: Nav, body: &str, script: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", title)
        .replace("{{NAV}}", &nav(active))
        .replace("{{BODY}}", body)
        .replace("{{SCRIPT}}", script)
}

/// The search, status and time-window controls shared by both alert pages.
fn filter_form(endpoint: &str, target: &str, placeholder: &str) -> String {
    let statuses: String = StatusFilter::ALL
        .iter()
        .map(|s| format!(r#"<option value="{}">{}</option>"#, s.as_str(), s.label()))
        .collect();
    let windows: String = TimeWindow::ALL
        .iter()
        .map(|w| format!(r#"<option value="{}">{}</option>"#, w.as_str(), w.label()))
        .collect();
    format!(
        r##"<form id="filters" class="filters" hx-get="{endpoint}" hx-target="{target}" hx-trigger="input delay:300ms, change" onsubmit="return false">
            <input id="search" name="search" type="search" placeholder="{placeholder}" autocomplete="off">
            <select name="status">{statuses}</select>
            <select name="time">{windows}</select>
        </form>"##
    )
}

/// Events that re-fetch an alert fragment.
const FRAGMENT_TRIGGERS: &str = "load, sse:alerts-changed, alerts-refresh from:body, every 30s";

const REFRESH_BUTTON: &str = r#"<button id="refresh" class="btn" type="button" hx-post="/alerts/refresh" hx-swap="none">⟳ Refresh</button>"#;

fn alert_body(template: &str, filters: &str) -> String {
    template
        .replace("{{FILTERS}}", filters)
        .replace("{{REFRESH}}", REFRESH_BUTTON)
        .replace("{{TRIGGERS}}", FRAGMENT_TRIGGERS)
}

/// Live map with the alert side list.
///
/// A `focus` (from "view on map") re-centers the map and opens the alert's
/// popup as soon as its marker is drawn.
#[must_use]
pub fn map_page(focus: Option<&MapFocus>) -> String {
    let mut script = LeafletScript::new();
    if let Some(focus) = focus {
        script.focus(focus);
    }
    let (lat, lng, zoom) = DEFAULT_VIEW;
    let body = alert_body(
        MAP_BODY,
        &filter_form("/map/alerts", "#alert-list", "Search by name or location..."),
    )
    .replace("{{VIEW}}", &format!("[{lat}, {lng}], {zoom}"))
    .replace("{{FOCUS}}", &script.finish());
    layout("Live Map", Nav::Map, &body, "")
}

/// Paginated alert history.
#[must_use]
pub fn alerts_page() -> String {
    let body = alert_body(
        ALERTS_BODY,
        &filter_form(
            "/alerts/table",
            "#history",
            "Search by name, location or message...",
        ),
    );
    layout("Recent Alerts", Nav::Alerts, &body, "")
}

/// Support desk: helplines, contact channels, contact form, newsletter
/// and FAQ.
#[must_use]
pub fn contact_page() -> String {
    let body = CONTACT_BODY
        .replace("{{EMERGENCY}}", &render::emergency_cards())
        .replace("{{CHANNELS}}", &render::support_channels())
        .replace("{{METER}}", &render::length_meter(""))
        .replace("{{LIMIT}}", &MESSAGE_LIMIT.to_string())
        .replace("{{FAQ}}", &render::faq(&FaqAccordion::new()));
    layout("Support", Nav::Contact, &body, CONTACT_SCRIPT)
}

// ============================================================================
// HTML Templates
// ============================================================================

const LAYOUT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Rakshita | {{TITLE}}</title>

    <!-- HTMX + SSE -->
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://unpkg.com/htmx.org@1.9.10/dist/ext/sse.js"></script>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        :root {
            --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            --bg: #f8f9fb;
            --card: #ffffff;
            --text: #1f2933;
            --muted: #6b7280;
            --border: #e5e7eb;
            --brand: #8e44ad;
            --danger: #e74c3c;
            --success: #27ae60;
            --warning: #f39c12;
            --radius: 10px;
            --shadow: 0 4px 12px rgba(0,0,0,0.08);
        }

        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: var(--font); background: var(--bg); color: var(--text); }

        .topbar {
            display: flex; align-items: center; justify-content: space-between;
            padding: 14px 24px; background: var(--card); border-bottom: 1px solid var(--border);
        }
        .brand { font-weight: 700; font-size: 20px; color: var(--brand); }
        .topbar nav a {
            margin-left: 18px; color: var(--muted); text-decoration: none; font-weight: 500;
        }
        .topbar nav a.active { color: var(--brand); }

        main { padding: 20px 24px; }

        .filters { display: flex; gap: 10px; flex-wrap: wrap; margin-bottom: 14px; }
        .filters input, .filters select {
            padding: 8px 12px; border: 1px solid var(--border); border-radius: var(--radius);
            font: inherit; background: var(--card);
        }
        .filters input { flex: 1; min-width: 200px; }

        .stats { display: flex; gap: 20px; margin-bottom: 14px; color: var(--muted); }
        .stats strong { color: var(--text); }
        .badge-count {
            background: var(--danger); color: #fff; border-radius: 999px; padding: 2px 10px;
        }

        .status-badge {
            display: inline-block; padding: 2px 10px; border-radius: 999px;
            font-size: 12px; font-weight: 600; text-transform: uppercase; color: #fff;
        }
        .status-active { background: var(--danger); }
        .status-resolved { background: var(--success); }

        .empty-state { text-align: center; padding: 40px 20px; color: var(--muted); }
        .empty-state .icon { font-size: 40px; margin-bottom: 10px; }

        /* Map page */
        .map-layout { display: grid; grid-template-columns: 360px 1fr; gap: 16px; height: calc(100vh - 110px); }
        .sidebar { display: flex; flex-direction: column; overflow: hidden; }
        #alert-list { overflow-y: auto; flex: 1; }
        #map { border-radius: var(--radius); box-shadow: var(--shadow); }
        .alert-item {
            background: var(--card); border-radius: var(--radius); padding: 12px; margin-bottom: 10px;
            border-left: 4px solid var(--danger); cursor: pointer; box-shadow: var(--shadow);
        }
        .alert-item.alert-resolved { border-left-color: var(--success); }
        .alert-header { display: flex; justify-content: space-between; margin-bottom: 6px; }
        .alert-name { font-weight: 600; }
        .alert-location, .alert-time { color: var(--muted); font-size: 13px; }
        .alert-message { margin-top: 6px; font-style: italic; font-size: 13px; }

        /* History page */
        table { width: 100%; border-collapse: collapse; background: var(--card); border-radius: var(--radius); overflow: hidden; box-shadow: var(--shadow); }
        th, td { padding: 10px 12px; text-align: left; border-bottom: 1px solid var(--border); }
        th { background: #f3f4f6; font-size: 13px; text-transform: uppercase; color: var(--muted); }
        .message-cell { max-width: 280px; color: var(--muted); }
        .btn-icon { border: none; background: none; cursor: pointer; font-size: 16px; text-decoration: none; margin-right: 6px; }
        .pagination { display: flex; justify-content: center; align-items: center; gap: 14px; margin-top: 16px; }
        .page-btn, .btn {
            padding: 8px 16px; border-radius: var(--radius); border: 1px solid var(--border);
            background: var(--card); cursor: pointer; font: inherit; color: var(--text); text-decoration: none;
        }
        .page-btn:disabled { opacity: 0.4; cursor: default; }
        .btn-primary { background: var(--brand); color: #fff; border-color: var(--brand); }

        .modal-backdrop {
            position: fixed; inset: 0; background: rgba(0,0,0,0.45);
            display: flex; align-items: center; justify-content: center; z-index: 2000;
        }
        .modal { background: var(--card); border-radius: var(--radius); padding: 24px; width: min(520px, 92vw); }
        .modal-header { display: flex; justify-content: space-between; margin-bottom: 16px; }
        .modal-close { border: none; background: none; font-size: 24px; cursor: pointer; }
        .detail-grid { display: grid; grid-template-columns: 120px 1fr; gap: 8px; }
        .detail-grid dt { color: var(--muted); }
        .modal-actions { margin-top: 18px; text-align: right; }

        /* Toasts and banners */
        #toasts { position: fixed; top: 80px; right: 20px; z-index: 3000; }
        .toast {
            background: var(--danger); color: #fff; padding: 12px 18px; border-radius: var(--radius);
            margin-bottom: 10px; box-shadow: var(--shadow);
        }
        .notice { padding: 12px 16px; border-radius: var(--radius); margin-bottom: 14px; }
        .notice-success { background: #e8f8ef; color: #1e7e4a; }
        .notice-error { background: #fdecea; color: #b03a2e; }

        /* Contact page */
        .contact-layout { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
        .card { background: var(--card); border-radius: var(--radius); padding: 20px; box-shadow: var(--shadow); margin-bottom: 20px; }
        .card h2 { margin-bottom: 14px; font-size: 18px; }
        .field { display: flex; flex-direction: column; margin-bottom: 12px; }
        .field label { font-size: 13px; color: var(--muted); margin-bottom: 4px; }
        .field input, .field select, .field textarea {
            padding: 10px 12px; border: 2px solid #eee; border-radius: var(--radius); font: inherit;
        }
        .field textarea { min-height: 140px; resize: vertical; }
        .length-meter { font-size: 12px; text-align: right; margin-top: 4px; }
        .htmx-indicator { display: none; }
        .htmx-request .htmx-indicator, .htmx-request.htmx-indicator { display: inline; }
        .faq-item { border-bottom: 1px solid var(--border); }
        .faq-question {
            width: 100%; display: flex; justify-content: space-between; padding: 14px 0;
            border: none; background: none; font: inherit; font-weight: 600; cursor: pointer; text-align: left;
        }
        .faq-answer { padding: 0 0 14px; color: var(--muted); }
        .faq-item.active .faq-question { color: var(--brand); }
        .emergency-grid, .channel-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; }
        .emergency-card, .contact-card {
            border: 1px solid var(--border); border-radius: var(--radius); background: var(--card);
            padding: 14px; cursor: pointer; font: inherit; text-align: left;
        }
        .emergency-card { border-left: 4px solid var(--danger); }
        .emergency-number { display: block; font-size: 22px; font-weight: 700; color: var(--danger); }
        .contact-card p { color: var(--muted); font-size: 13px; margin-top: 4px; }
    </style>
</head>
<body>
    <header class="topbar">
        <div class="brand">🛡 Rakshita</div>
        <nav>
            {{NAV}}
        </nav>
    </header>
    <main>
{{BODY}}
    </main>
    <script>
        // Banners and toasts remove themselves after their TTL
        htmx.onLoad(function (elt) {
            var found = elt.matches && elt.matches('[data-ttl-ms]') ? [elt] : [];
            if (elt.querySelectorAll) {
                found = found.concat(Array.from(elt.querySelectorAll('[data-ttl-ms]')));
            }
            found.forEach(function (el) {
                setTimeout(function () { el.remove(); }, parseInt(el.dataset.ttlMs, 10));
            });
        });
    </script>
{{SCRIPT}}
</body>
</html>"##;

const MAP_BODY: &str = r##"<div class="map-layout" hx-ext="sse" sse-connect="/stream">
    <aside class="sidebar">
        <div class="stats">
            <span>Active alerts <span id="alert-count" class="badge-count">0</span></span>
            <span>Updated <strong id="last-updated">Just now</strong></span>
            {{REFRESH}}
        </div>
        {{FILTERS}}
        <div id="alert-list" hx-get="/map/alerts" hx-include="#filters" hx-trigger="{{TRIGGERS}}"></div>
    </aside>
    <div id="map"></div>
    <div id="toasts" sse-swap="notification" hx-swap="afterbegin"></div>
</div>
<script>
    var rakshita = (function () {
        var map = L.map('map').setView({{VIEW}});
        L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
            attribution: '&copy; OpenStreetMap contributors'
        }).addTo(map);
        var markers = {};
        var pending = null;
        return {
            clear: function () {
                Object.keys(markers).forEach(function (id) { map.removeLayer(markers[id]); });
                markers = {};
            },
            add: function (m) {
                var marker = L.circleMarker([m.lat, m.lng], {
                    radius: 9, fillColor: m.color, color: '#fff', weight: 2, fillOpacity: 0.9
                }).addTo(map).bindPopup(m.popup);
                markers[m.id] = marker;
                if (pending === m.id) { marker.openPopup(); pending = null; }
            },
            focus: function (lat, lng, zoom, id) {
                map.setView([lat, lng], zoom);
                if (id === null) return;
                if (markers[id]) { markers[id].openPopup(); } else { pending = id; }
            }
        };
    })();
</script>
{{FOCUS}}"##;

const ALERTS_BODY: &str = r##"<div hx-ext="sse" sse-connect="/stream">
    <div class="stats">
        <span>Total alerts <strong id="total-alerts">0</strong></span>
        <span>Active <span id="alert-count" class="badge-count">0</span></span>
        <span>Updated <strong id="last-updated">Just now</strong></span>
        {{REFRESH}}
    </div>
    <div style="display: flex; gap: 10px; align-items: flex-start;">
        <div style="flex: 1;">{{FILTERS}}</div>
        <button class="btn" type="button"
                onclick="location.href = '/alerts/export.csv?' + new URLSearchParams(new FormData(document.getElementById('filters')))">
            ⬇ Export CSV
        </button>
    </div>
    <input type="hidden" id="page" name="page" value="1">
    <div id="history" hx-get="/alerts/table" hx-include="#filters, #page" hx-trigger="{{TRIGGERS}}"></div>
    <div id="modal"></div>
    <div id="toasts" sse-swap="notification" hx-swap="afterbegin"></div>
</div>"##;

const CONTACT_BODY: &str = r##"<div class="card">
    <h2>Emergency Numbers</h2>
    {{EMERGENCY}}
</div>
<div id="notice-area"></div>
<div class="contact-layout">
    <section>
        <div class="card">
            <h2>Reach Us</h2>
            {{CHANNELS}}
        </div>
        <div class="card">
            <h2>Contact Support</h2>
            <form id="contact-form" hx-post="/contact/submit" hx-target="#notice-area" hx-indicator="#sending">
                <div class="field">
                    <label for="name">Name</label>
                    <input id="name" name="name" type="text">
                </div>
                <div class="field">
                    <label for="email">Email</label>
                    <input id="email" name="email" type="text">
                </div>
                <div class="field">
                    <label for="subject">Subject</label>
                    <input id="subject" name="subject" type="text">
                </div>
                <div class="field">
                    <label for="category">Category</label>
                    <select id="category" name="category">
                        <option value="">Select a category</option>
                        <option value="general">General</option>
                        <option value="technical">Technical issue</option>
                        <option value="account">Account</option>
                        <option value="feedback">Feedback</option>
                        <option value="emergency">Emergency follow-up</option>
                    </select>
                </div>
                <div class="field">
                    <label for="message">Message</label>
                    <textarea id="message" name="message" maxlength="{{LIMIT}}"></textarea>
                    {{METER}}
                </div>
                <button class="btn btn-primary" type="submit">
                    Send Message <span id="sending" class="htmx-indicator">⏳</span>
                </button>
            </form>
        </div>
        <div class="card">
            <h2>Stay Updated</h2>
            <div id="subscribe-notice"></div>
            <form hx-post="/contact/subscribe" hx-target="#subscribe-notice" hx-indicator="#subscribing">
                <div class="field">
                    <input name="email" type="text" placeholder="you@example.com">
                </div>
                <button class="btn" type="submit">
                    Subscribe <span id="subscribing" class="htmx-indicator">⏳</span>
                </button>
            </form>
        </div>
    </section>
    <section class="card">
        <h2>Frequently Asked Questions</h2>
        {{FAQ}}
    </section>
    <div id="autosave" hidden></div>
</div>"##;

const CONTACT_SCRIPT: &str = r##"<script>
    (function () {
        var form = document.getElementById('contact-form');
        var fields = form.querySelectorAll('[name]');

        function save(el) {
            htmx.ajax('POST', '/contact/field', {
                values: { field: el.name, value: el.value },
                target: '#autosave',
                swap: 'innerHTML'
            });
        }

        fields.forEach(function (el) {
            el.addEventListener('input', function () { save(el); });
        });

        // Restore whatever was typed before the last reload
        fetch('/contact/fields')
            .then(function (r) { return r.json(); })
            .then(function (saved) {
                fields.forEach(function (el) {
                    if (saved[el.name] !== undefined) { el.value = saved[el.name]; }
                });
                save(document.getElementById('message'));
            });

        htmx.onLoad(function (elt) {
            if (elt.id === 'message-meter') {
                document.getElementById('message').style.borderColor = elt.dataset.border;
            }
        });

        document.body.addEventListener('contact-sent', function () { form.reset(); });
    })();
</script>"##;
