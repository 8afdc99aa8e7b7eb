//! Containment Resolver
//!
//! Turns a map click into a selection change. When several rendered zones
//! contain the click, repeated clicks cycle through them in store order.

use shared::{LatLng, Zone};

use crate::geometry;

/// Outcome of a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Select(String),
    Deselect,
    Unchanged,
}

fn toggle(id: &str, active: Option<&str>) -> Resolution {
    if active == Some(id) {
        Resolution::Deselect
    } else {
        Resolution::Select(id.to_string())
    }
}

/// Resolve a click at `point`.
///
/// `rendered` are the zones currently drawn (already filtered by the
/// visibility rule), `native_hit` the zone the map widget itself hit-tested.
pub fn resolve_click<'a>(
    point: LatLng,
    rendered: impl IntoIterator<Item = &'a Zone>,
    active: Option<&str>,
    native_hit: Option<&str>,
) -> Resolution {
    let candidates: Vec<&Zone> = rendered
        .into_iter()
        .filter(|z| geometry::contains(&z.geometry, point))
        .collect();

    match candidates.as_slice() {
        [] => match native_hit {
            Some(id) => toggle(id, active),
            None => Resolution::Unchanged,
        },
        [only] => toggle(&only.id, active),
        many => {
            let next = match active.and_then(|a| many.iter().position(|z| z.id == a)) {
                Some(i) => (i + 1) % many.len(),
                None => 0,
            };
            Resolution::Select(many[next].id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Geometry;

    const HIT: LatLng = LatLng::new(5.34, -4.02);
    const MISS: LatLng = LatLng::new(6.5, -3.0);

    fn circle(id: &str) -> Zone {
        Zone::new(id, id, Geometry::circle(HIT, 2.0))
    }

    fn far(id: &str) -> Zone {
        Zone::new(id, id, Geometry::circle(LatLng::new(7.0, -5.0), 1.0))
    }

    #[test]
    fn test_single_candidate_toggles() {
        let zones = [circle("A"), far("B")];
        assert_eq!(
            resolve_click(HIT, &zones, None, None),
            Resolution::Select("A".into())
        );
        assert_eq!(resolve_click(HIT, &zones, Some("A"), None), Resolution::Deselect);
        assert_eq!(
            resolve_click(HIT, &zones, Some("B"), None),
            Resolution::Select("A".into())
        );
    }

    #[test]
    fn test_overlap_cycles() {
        let zones = [circle("A"), circle("B")];
        let mut active: Option<String> = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            match resolve_click(HIT, &zones, active.as_deref(), None) {
                Resolution::Select(id) => {
                    seen.push(id.clone());
                    active = Some(id);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen, vec!["A", "B", "A", "B"]);
    }

    #[test]
    fn test_overlap_with_unrelated_active_starts_at_first() {
        let zones = [circle("A"), circle("B"), far("C")];
        assert_eq!(
            resolve_click(HIT, &zones, Some("C"), None),
            Resolution::Select("A".into())
        );
    }

    #[test]
    fn test_no_candidate_falls_back_to_native_hit() {
        let zones = [circle("A")];
        assert_eq!(
            resolve_click(MISS, &zones, None, Some("P1")),
            Resolution::Select("P1".into())
        );
        assert_eq!(
            resolve_click(MISS, &zones, Some("P1"), Some("P1")),
            Resolution::Deselect
        );
        assert_eq!(resolve_click(MISS, &zones, Some("A"), None), Resolution::Unchanged);
    }
}
