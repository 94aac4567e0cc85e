//! HTML fragments for HTMX swaps.
//!
//! Every function is pure: it takes a snapshot (or a single record) plus
//! `now` and returns markup. Pages replace the whole fragment on every
//! recomputation, so nothing here diffs against previous output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::contact::{
    EMERGENCY_SERVICES, FAQ_ITEMS, FaqAccordion, LengthLevel, MESSAGE_LIMIT, NOTICE_TTL, Notice,
    SupportChannel,
};
use crate::map;
use crate::models::{AlertRecord, AlertStatus};
use crate::timefmt;
use crate::view::ViewSnapshot;

/// Escape text for use in element content and quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_badge(status: AlertStatus) -> String {
    format!(
        r#"<span class="status-badge status-{s}">{s}</span>"#,
        s = status.as_str()
    )
}

fn message_html(alert: &AlertRecord) -> String {
    alert
        .message
        .as_deref()
        .map(|m| format!(r#"<div class="alert-message">{}</div>"#, escape(m)))
        .unwrap_or_default()
}

fn empty_state() -> &'static str {
    r#"<div class="empty-state">
  <div class="icon">🔍</div>
  <h3>No alerts found</h3>
  <p>No SOS alerts match your current filters.</p>
</div>"#
}

/// Side list next to the live map. Clicking an item focuses its marker.
#[must_use]
pub fn alert_list(snapshot: &ViewSnapshot<'_>, now: DateTime<Utc>) -> String {
    if snapshot.is_empty() {
        return empty_state().to_string();
    }

    let mut html = String::new();
    for alert in snapshot.visible() {
        let _ = write!(
            html,
            r#"<div class="alert-item alert-{status}" id="alert-{id}" onclick="rakshita.focus({lat}, {lng}, {zoom}, {id})">
  <div class="alert-header">
    <span class="alert-name">{name}</span>
    {badge}
  </div>
  <div class="alert-location">📍 {location}</div>
  <div class="alert-time">◷ {age}</div>
  {message}
</div>
"#,
            status = alert.status.as_str(),
            id = alert.id,
            lat = alert.latitude,
            lng = alert.longitude,
            zoom = map::FOCUS_ZOOM,
            name = escape(&alert.name),
            badge = status_badge(alert.status),
            location = escape(&alert.location),
            age = timefmt::relative_time(alert.timestamp, now),
            message = message_html(alert),
        );
    }
    html
}

/// Body rows for the history table, one per alert on the current page.
#[must_use]
pub fn alert_rows(snapshot: &ViewSnapshot<'_>, now: DateTime<Utc>) -> String {
    if snapshot.is_empty() {
        return format!(r#"<tr class="empty-row"><td colspan="6">{}</td></tr>"#, empty_state());
    }

    let mut html = String::new();
    for alert in snapshot.visible() {
        let _ = write!(
            html,
            r##"<tr id="alert-{id}">
  <td>{name}</td>
  <td>{location}</td>
  <td title="{absolute}">{age}</td>
  <td>{badge}</td>
  <td class="message-cell">{message}</td>
  <td class="actions">
    <button class="btn-icon" title="View details" hx-get="/alerts/{id}" hx-target="#modal" hx-swap="innerHTML">👁</button>
    <a class="btn-icon" title="View on map" href="{map_link}" target="_blank" rel="noopener">🗺</a>
  </td>
</tr>
"##,
            id = alert.id,
            name = escape(&alert.name),
            location = escape(&alert.location),
            absolute = timefmt::localized(alert.timestamp),
            age = timefmt::relative_time(alert.timestamp, now),
            badge = status_badge(alert.status),
            message = alert.message.as_deref().map(escape).unwrap_or_default(),
            map_link = escape(&map::map_link(alert)),
        );
    }
    html
}

/// Prev/next bar for the history table.
///
/// Buttons step from the page shown and include the filter form, so a page
/// change never loses the criteria.
#[must_use]
pub fn pagination(snapshot: &ViewSnapshot<'_>) -> String {
    let page = snapshot.page();
    let button = |label: &str, step: &str, enabled: bool| {
        if enabled {
            format!(
                r##"<button class="page-btn" hx-get="/alerts/table?page={page}&amp;step={step}" hx-include="#filters" hx-target="#history">{label}</button>"##
            )
        } else {
            format!(r#"<button class="page-btn" disabled>{label}</button>"#)
        }
    };

    format!(
        r#"<div class="pagination" id="pagination">
  {prev}
  <span class="page-info">Page {page} of {count}</span>
  {next}
</div>"#,
        prev = button("← Previous", "prev", snapshot.has_prev()),
        count = snapshot.page_count(),
        next = button("Next →", "next", snapshot.has_next()),
    )
}

/// Out-of-band counters: total alerts, active badge and last update.
#[must_use]
pub fn stats(snapshot: &ViewSnapshot<'_>, now: DateTime<Utc>) -> String {
    let updated = snapshot
        .last_updated()
        .map_or_else(|| "Just now".to_string(), |t| timefmt::relative_time(t, now));
    format!(
        r#"<span id="total-alerts" hx-swap-oob="true">{total}</span>
<span id="alert-count" hx-swap-oob="true">{active}</span>
<span id="last-updated" hx-swap-oob="true">{updated}</span>"#,
        total = snapshot.total(),
        active = snapshot.active_count(),
    )
}

/// Detail modal for one alert.
#[must_use]
pub fn detail_modal(alert: &AlertRecord, now: DateTime<Utc>) -> String {
    let message = alert
        .message
        .as_deref()
        .map_or_else(|| r#"<em>No message</em>"#.to_string(), escape);
    format!(
        r#"<div class="modal-backdrop" onclick="if (event.target === this) this.parentElement.innerHTML = ''">
  <div class="modal">
    <div class="modal-header">
      <h2>SOS Alert #{id}</h2>
      <button class="modal-close" onclick="document.getElementById('modal').innerHTML = ''">×</button>
    </div>
    <dl class="detail-grid">
      <dt>User</dt><dd>{name}</dd>
      <dt>Location</dt><dd>{location}</dd>
      <dt>Coordinates</dt><dd>{coords}</dd>
      <dt>Time</dt><dd>{time} ({age})</dd>
      <dt>Status</dt><dd>{badge}</dd>
      <dt>Message</dt><dd>{message}</dd>
    </dl>
    <div class="modal-actions">
      <a class="btn" href="{map_link}" target="_blank" rel="noopener">View on map</a>
    </div>
  </div>
</div>"#,
        id = alert.id,
        name = escape(&alert.name),
        location = escape(&alert.location),
        coords = timefmt::coordinates(alert.latitude, alert.longitude),
        time = timefmt::localized(alert.timestamp),
        age = timefmt::relative_time(alert.timestamp, now),
        badge = status_badge(alert.status),
        map_link = escape(&map::map_link(alert)),
    )
}

/// Marker popup content.
#[must_use]
pub fn popup(alert: &AlertRecord, now: DateTime<Utc>) -> String {
    format!(
        r#"<div class="popup"><strong>{name}</strong><br>{location}<br>{age}<br>{badge}{message}</div>"#,
        name = escape(&alert.name),
        location = escape(&alert.location),
        age = timefmt::relative_time(alert.timestamp, now),
        badge = status_badge(alert.status),
        message = message_html(alert),
    )
}

/// Toast shown when a new alert arrives.
#[must_use]
pub fn toast(alert: &AlertRecord) -> String {
    format!(
        r#"<div class="toast" data-ttl-ms="{ttl}">🆘 New SOS alert from {name}</div>"#,
        ttl = NOTICE_TTL.as_millis(),
        name = escape(&alert.name),
    )
}

/// Banner above the contact forms. Dismisses itself after `NOTICE_TTL`.
#[must_use]
pub fn banner(notice: &Notice) -> String {
    format!(
        r#"<div class="notice notice-{kind}" data-ttl-ms="{ttl}">{text}</div>"#,
        kind = notice.kind.as_str(),
        ttl = NOTICE_TTL.as_millis(),
        text = escape(&notice.text),
    )
}

/// The FAQ list. Each question asks the server to toggle itself given the
/// currently open index.
#[must_use]
pub fn faq(accordion: &FaqAccordion) -> String {
    let current = accordion
        .open_index()
        .map(|i| i.to_string())
        .unwrap_or_default();

    let mut html = String::from(r#"<div id="faq" class="faq">"#);
    for (index, (question, answer)) in FAQ_ITEMS.iter().enumerate() {
        let open = accordion.is_open(index);
        let _ = write!(
            html,
            r##"
  <div class="faq-item{active}">
    <button class="faq-question" hx-get="/contact/faq/{index}?open={current}" hx-target="#faq" hx-swap="outerHTML">
      {question}<span class="faq-toggle">{sign}</span>
    </button>
    <div class="faq-answer"{hidden}>{answer}</div>
  </div>"##,
            active = if open { " active" } else { "" },
            sign = if open { "−" } else { "+" },
            hidden = if open { "" } else { " hidden" },
        );
    }
    html.push_str("\n</div>");
    html
}

fn confirm_attr(prompt: Option<&str>) -> String {
    prompt
        .map(|p| format!(r#" hx-confirm="{}""#, escape(p)))
        .unwrap_or_default()
}

/// Helpline cards. Each asks for confirmation before "calling".
#[must_use]
pub fn emergency_cards() -> String {
    let mut html = String::from(r#"<div class="emergency-grid">"#);
    for (index, service) in EMERGENCY_SERVICES.iter().enumerate() {
        let _ = write!(
            html,
            r##"
  <button class="emergency-card" type="button" hx-post="/contact/call/{index}" hx-target="#notice-area"{confirm}>
    <h3>{name}</h3>
    <span class="emergency-number">{number}</span>
  </button>"##,
            confirm = confirm_attr(Some(&service.confirm_prompt())),
            name = escape(service.name),
            number = escape(service.number),
        );
    }
    html.push_str("\n</div>");
    html
}

/// Email, phone and live chat cards.
#[must_use]
pub fn support_channels() -> String {
    let mut html = String::from(r#"<div class="channel-grid">"#);
    for channel in SupportChannel::ALL {
        let _ = write!(
            html,
            r##"
  <button class="contact-card" type="button" hx-post="/contact/channel/{slug}" hx-target="#notice-area"{confirm}>
    <h3>{title}</h3>
    <p>{detail}</p>
  </button>"##,
            slug = channel.as_str(),
            confirm = confirm_attr(channel.confirm_prompt().as_deref()),
            title = channel.title(),
            detail = escape(channel.detail()),
        );
    }
    html.push_str("\n</div>");
    html
}

/// Character counter under the message box, colored by `LengthLevel`.
///
/// Marked out-of-band so an auto-save response can replace it in place.
#[must_use]
pub fn length_meter(message: &str) -> String {
    let level = LengthLevel::of(message);
    format!(
        r#"<div id="message-meter" class="length-meter" hx-swap-oob="true" style="color: {color}" data-border="{color}">{len} / {MESSAGE_LIMIT}</div>"#,
        color = level.color(),
        len = message.chars().count(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::PageKind;
    use crate::models::fixtures::alert;
    use crate::store::AlertStore;
    use crate::view::AlertView;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn store(count: u64) -> AlertStore {
        let alerts = (1..=count)
            .map(|i| alert(i, "Mumbai, Maharashtra", AlertStatus::Active, 5, now()))
            .collect();
        AlertStore::seeded(alerts, now()).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_empty_list_and_table() {
        let store = AlertStore::new();
        let snap = AlertView::new(PageKind::LiveMap).snapshot(&store, now());
        assert!(alert_list(&snap, now()).contains("No SOS alerts match your current filters."));

        let snap = AlertView::new(PageKind::History).snapshot(&store, now());
        let rows = alert_rows(&snap, now());
        assert!(rows.contains("No alerts found"));
        assert!(rows.contains("colspan=\"6\""));
    }

    #[test]
    fn test_list_escapes_user_text() {
        let mut a = alert(1, "Pune", AlertStatus::Active, 0, now());
        a.name = "<script>x</script>".into();
        let store = AlertStore::seeded(vec![a], now()).unwrap();
        let snap = AlertView::new(PageKind::LiveMap).snapshot(&store, now());
        let html = alert_list(&snap, now());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_rows_have_actions() {
        let store = store(3);
        let snap = AlertView::new(PageKind::History).snapshot(&store, now());
        let rows = alert_rows(&snap, now());
        assert_eq!(rows.matches("<tr ").count(), 3);
        assert!(rows.contains(r#"hx-get="/alerts/2""#));
        assert!(rows.contains(
            r#"href="/map?lat=19.076&amp;lng=72.8777&amp;alert=2" target="_blank""#
        ));
        assert!(rows.contains("5 minutes ago"));
    }

    #[test]
    fn test_pagination_bounds() {
        let store = store(25);
        let mut view = AlertView::new(PageKind::History);
        let snap = view.snapshot(&store, now());
        let bar = pagination(&snap);
        assert!(bar.contains("Page 1 of 3"));
        assert!(bar.contains(r#"<button class="page-btn" disabled>← Previous</button>"#));
        assert!(bar.contains("/alerts/table?page=1&amp;step=next"));

        assert!(view.go_to_page(3, &snap));
        let bar = pagination(&view.snapshot(&store, now()));
        assert!(bar.contains("Page 3 of 3"));
        assert!(bar.contains(r#"<button class="page-btn" disabled>Next →</button>"#));
        assert!(bar.contains("/alerts/table?page=3&amp;step=prev"));
    }

    #[test]
    fn test_stats() {
        let store = store(4);
        let snap = AlertView::new(PageKind::History).snapshot(&store, now());
        let html = stats(&snap, now());
        assert!(html.contains(r#"<span id="total-alerts" hx-swap-oob="true">4</span>"#));
        assert!(html.contains(r#"<span id="alert-count" hx-swap-oob="true">4</span>"#));
        assert!(html.contains("Just now"));
    }

    #[test]
    fn test_detail_modal() {
        let mut a = alert(9, "Delhi, Delhi", AlertStatus::Resolved, 150, now());
        a.latitude = 28.613_939;
        a.longitude = 77.209_021;
        let html = detail_modal(&a, now());
        assert!(html.contains("SOS Alert #9"));
        assert!(html.contains("28.613939, 77.209021"));
        assert!(html.contains("2 hours ago"));
        assert!(html.contains("No message"));
        assert!(html.contains(r#"target="_blank">View on map</a>"#));
    }

    #[test]
    fn test_toast_and_banner() {
        let a = alert(1, "Pune", AlertStatus::Active, 0, now());
        assert!(toast(&a).contains("New SOS alert from Reporter 1"));

        let html = banner(&Notice::error("Name must be at least 2 characters long"));
        assert!(html.contains("notice-error"));
        assert!(html.contains(r#"data-ttl-ms="5000""#));
    }

    #[test]
    fn test_faq_one_open() {
        let html = faq(&FaqAccordion::with_open(Some(1)));
        assert_eq!(html.matches("faq-item active").count(), 1);
        assert_eq!(html.matches(" hidden>").count(), FAQ_ITEMS.len() - 1);
        assert!(html.contains("/contact/faq/3?open=1"));

        let closed = faq(&FaqAccordion::new());
        assert!(closed.contains("/contact/faq/0?open=\""));
    }

    #[test]
    fn test_emergency_cards_confirm() {
        let html = emergency_cards();
        assert_eq!(html.matches("emergency-card").count(), EMERGENCY_SERVICES.len());
        assert!(html.contains(r#"hx-post="/contact/call/1""#));
        assert!(html.contains(r#"hx-confirm="Do you want to call Police at 100?""#));
    }

    #[test]
    fn test_support_channel_cards() {
        let html = support_channels();
        assert!(html.contains(r#"hx-post="/contact/channel/email""#));
        assert!(html.contains(r#"hx-post="/contact/channel/chat""#));
        // Only the phone card asks first
        assert_eq!(html.matches("hx-confirm").count(), 1);
        assert!(html.contains("support@rakshita.in"));
    }

    #[test]
    fn test_length_meter_colors() {
        assert!(length_meter("hi").contains("2 / 1000"));
        assert!(length_meter(&"x".repeat(900)).contains("#f39c12"));
        assert!(length_meter(&"x".repeat(1200)).contains("#e74c3c"));
    }
}
