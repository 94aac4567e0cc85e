//! Map markers and the Leaflet bridge.
//!
//! The map itself lives in the browser; Rust only decides which markers
//! exist and where the map looks. `LeafletScript` turns those decisions into
//! calls on the small `rakshita` helper object defined by the map page.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{AlertId, AlertRecord, AlertStatus};
use crate::render;

/// Zoom level used when focusing a single alert.
pub const FOCUS_ZOOM: u8 = 15;

/// Initial view: all of India.
pub const DEFAULT_VIEW: (f64, f64, u8) = (20.5937, 78.9629, 5);

const ACTIVE_COLOR: &str = "#e74c3c";
const RESOLVED_COLOR: &str = "#27ae60";

/// One map point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: AlertId,
    pub lat: f64,
    pub lng: f64,
    pub color: &'static str,
    pub popup: String,
}

impl Marker {
    #[must_use]
    pub fn for_alert(alert: &AlertRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: alert.id,
            lat: alert.latitude,
            lng: alert.longitude,
            color: match alert.status {
                AlertStatus::Active => ACTIVE_COLOR,
                AlertStatus::Resolved => RESOLVED_COLOR,
            },
            popup: render::popup(alert, now),
        }
    }
}

/// Re-center request, usually from the `lat`/`lng`/`alert` query string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFocus {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    /// Popup to open once its marker exists
    pub alert: Option<AlertId>,
}

impl MapFocus {
    /// Focus on a coordinate pair. Both halves are required and must be on
    /// the globe; anything else means "no focus".
    #[must_use]
    pub fn from_query(lat: Option<f64>, lng: Option<f64>, alert: Option<AlertId>) -> Option<Self> {
        let (lat, lng) = (lat?, lng?);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self {
            lat,
            lng,
            zoom: FOCUS_ZOOM,
            alert,
        })
    }
}

/// "View on map" link for one alert.
#[must_use]
pub fn map_link(alert: &AlertRecord) -> String {
    format!(
        "/map?lat={}&lng={}&alert={}",
        alert.latitude, alert.longitude, alert.id
    )
}

/// Something that can show markers.
pub trait MapAdapter {
    fn clear_markers(&mut self);
    fn add_marker(&mut self, marker: Marker);
    fn focus(&mut self, focus: &MapFocus);
}

/// Replace every marker with one per alert, in order.
pub fn sync_markers<M: MapAdapter + ?Sized>(
    adapter: &mut M,
    alerts: &[&AlertRecord],
    now: DateTime<Utc>,
) {
    adapter.clear_markers();
    for alert in alerts {
        adapter.add_marker(Marker::for_alert(alert, now));
    }
}

/// Collects map calls as a `<script>` block for an HTMX fragment.
#[derive(Debug, Default)]
pub struct LeafletScript {
    calls: Vec<String>,
}

impl LeafletScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished `<script>` element, or an empty string if nothing was queued.
    #[must_use]
    pub fn finish(self) -> String {
        if self.calls.is_empty() {
            return String::new();
        }
        format!("<script>\n{}\n</script>", self.calls.join("\n"))
    }
}

/// JSON that is safe to inline into a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

impl MapAdapter for LeafletScript {
    fn clear_markers(&mut self) {
        self.calls.push("rakshita.clear();".to_string());
    }

    fn add_marker(&mut self, marker: Marker) {
        self.calls.push(format!("rakshita.add({});", script_json(&marker)));
    }

    fn focus(&mut self, focus: &MapFocus) {
        let alert = focus.alert.map_or_else(|| "null".to_string(), |id| id.to_string());
        self.calls.push(format!(
            "rakshita.focus({}, {}, {}, {alert});",
            focus.lat, focus.lng, focus.zoom
        ));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::fixtures::alert;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        markers: Vec<Marker>,
        clears: usize,
        focused: Option<MapFocus>,
    }

    impl MapAdapter for Recorder {
        fn clear_markers(&mut self) {
            self.clears += 1;
            self.markers.clear();
        }

        fn add_marker(&mut self, marker: Marker) {
            self.markers.push(marker);
        }

        fn focus(&mut self, focus: &MapFocus) {
            self.focused = Some(*focus);
        }
    }

    #[test]
    fn test_sync_replaces_markers() {
        let a = alert(1, "Mumbai", AlertStatus::Active, 5, now());
        let b = alert(2, "Delhi", AlertStatus::Resolved, 10, now());
        let mut map = Recorder::default();

        sync_markers(&mut map, &[&a, &b], now());
        sync_markers(&mut map, &[&b], now());

        assert_eq!(map.clears, 2);
        assert_eq!(map.markers.len(), 1);
        assert_eq!(map.markers[0].id, AlertId(2));
        assert_eq!(map.markers[0].color, RESOLVED_COLOR);
    }

    #[test]
    fn test_marker_colors() {
        let a = alert(1, "Mumbai", AlertStatus::Active, 5, now());
        assert_eq!(Marker::for_alert(&a, now()).color, ACTIVE_COLOR);
    }

    #[test]
    fn test_focus_from_query() {
        let focus = MapFocus::from_query(Some(19.07), Some(72.87), Some(AlertId(4))).unwrap();
        assert_eq!(focus.zoom, FOCUS_ZOOM);
        assert_eq!(focus.alert, Some(AlertId(4)));

        assert!(MapFocus::from_query(Some(19.07), None, None).is_none());
        assert!(MapFocus::from_query(Some(95.0), Some(72.87), None).is_none());

        let mut map = Recorder::default();
        map.focus(&focus);
        assert_eq!(map.focused, Some(focus));
    }

    #[test]
    fn test_leaflet_script() {
        let mut a = alert(3, "Pune", AlertStatus::Active, 0, now());
        a.message = Some("</script><b>".into());
        let mut script = LeafletScript::new();
        sync_markers(&mut script, &[&a], now());
        script.focus(&MapFocus::from_query(Some(18.5), Some(73.8), Some(AlertId(3))).unwrap());
        let js = script.finish();

        assert!(js.starts_with("<script>\nrakshita.clear();\nrakshita.add({\"id\":3,"));
        assert!(js.contains("\"color\":\"#e74c3c\""));
        assert!(js.contains("rakshita.focus(18.5, 73.8, 15, 3);"));
        // Only the closing tag of the block itself
        assert_eq!(js.matches("</script>").count(), 1);
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(LeafletScript::new().finish(), "");
    }

    #[test]
    fn test_map_link() {
        let a = alert(8, "Mumbai", AlertStatus::Active, 0, now());
        assert_eq!(map_link(&a), "/map?lat=19.076&lng=72.8777&alert=8");
    }
}
