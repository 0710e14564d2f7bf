//! Candidate ranking for choose-operations.
//!
//! Ranking is a pure function over candidate metadata so it can be tested
//! without building any pipeline. The contract:
//!
//! 1. Candidates whose usage area misses the area of interest (or, absent
//!    one, the coordinate being transformed) are dropped; a candidate with
//!    no declared area counts as world-wide and always survives. If the
//!    filter would drop everything, it is ignored.
//! 2. Survivors sort by area extent (smaller first, unknown = world), then
//!    declared accuracy (better first, unknown last). Ties keep their
//!    registration order.

use crate::ident::{AreaOfInterest, UsageArea};

#[derive(Clone, Debug, Default)]
pub(crate) struct CandidateInfo {
    pub area: Option<UsageArea>,
    pub accuracy: Option<f64>,
}

const WORLD_EXTENT: f64 = 360.0 * 180.0;

fn extent(area: Option<&UsageArea>) -> f64 {
    area.map(|a| a.extent()).unwrap_or(WORLD_EXTENT)
}

fn matches_area(area: Option<&UsageArea>, aoi: Option<&AreaOfInterest>, point: Option<(f64, f64)>) -> bool {
    let Some(area) = area else { return true };
    if let Some(aoi) = aoi {
        return area.intersects(aoi);
    }
    if let Some((lon, lat)) = point {
        if lon.is_finite() && lat.is_finite() {
            return area.contains(lon, lat);
        }
    }
    true
}

/// Indices of `infos` in evaluation order.
pub(crate) fn rank(
    infos: &[CandidateInfo],
    aoi: Option<&AreaOfInterest>,
    point: Option<(f64, f64)>,
) -> Vec<usize> {
    let mut picked: Vec<usize> = (0..infos.len())
        .filter(|&i| matches_area(infos[i].area.as_ref(), aoi, point))
        .collect();
    if picked.is_empty() {
        picked = (0..infos.len()).collect();
    }
    picked.sort_by(|&a, &b| {
        let ia = &infos[a];
        let ib = &infos[b];
        extent(ia.area.as_ref())
            .total_cmp(&extent(ib.area.as_ref()))
            .then_with(|| match (ia.accuracy, ib.accuracy) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(area: Option<UsageArea>, accuracy: Option<f64>) -> CandidateInfo {
        CandidateInfo { area, accuracy }
    }

    fn europe() -> UsageArea {
        UsageArea::new(-10.0, 35.0, 30.0, 70.0, "Europe")
    }

    fn norway() -> UsageArea {
        UsageArea::new(4.0, 57.0, 32.0, 72.0, "Norway")
    }

    #[test]
    fn test_point_filters_candidates() {
        let infos = [
            info(Some(norway()), Some(1.0)),
            info(Some(europe()), Some(1.0)),
        ];
        // Paris is in Europe but not Norway.
        assert_eq!(rank(&infos, None, Some((2.35, 48.85))), vec![1]);
        // Oslo matches both; the tighter area wins.
        assert_eq!(rank(&infos, None, Some((10.75, 59.9))), vec![0, 1]);
    }

    #[test]
    fn test_aoi_beats_point() {
        let infos = [
            info(Some(norway()), Some(1.0)),
            info(Some(europe()), Some(1.0)),
        ];
        let aoi = AreaOfInterest::new(-5.0, 40.0, 5.0, 50.0, "France-ish");
        // The AOI misses Norway even though the point would match it.
        assert_eq!(rank(&infos, Some(&aoi), Some((10.75, 59.9))), vec![1]);
    }

    #[test]
    fn test_unknown_area_is_world() {
        let infos = [
            info(None, Some(5.0)),
            info(Some(europe()), Some(5.0)),
        ];
        // The areal candidate ranks first; the world-wide one stays usable.
        assert_eq!(rank(&infos, None, Some((2.35, 48.85))), vec![1, 0]);
    }

    #[test]
    fn test_accuracy_breaks_extent_ties() {
        let infos = [
            info(Some(europe()), None),
            info(Some(europe()), Some(3.0)),
            info(Some(europe()), Some(0.5)),
        ];
        assert_eq!(rank(&infos, None, None), vec![2, 1, 0]);
    }

    #[test]
    fn test_empty_filter_falls_back_to_all() {
        let infos = [
            info(Some(norway()), Some(1.0)),
            info(Some(europe()), Some(2.0)),
        ];
        // Sydney matches nothing; everything stays, ordered by extent.
        let order = rank(&infos, None, Some((151.2, -33.9)));
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_registration_order_breaks_full_ties() {
        let infos = [
            info(Some(europe()), Some(1.0)),
            info(Some(europe()), Some(1.0)),
        ];
        assert_eq!(rank(&infos, None, None), vec![0, 1]);
    }
}
