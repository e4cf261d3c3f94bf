use crate::area::PointOfInterest;

/// Tracks which points of interest currently have a marker on the map.
///
/// Markers are identified by their index into the dataset's point list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerOverlay {
    shown: Vec<usize>,
    area: Option<String>,
}

impl MarkerOverlay {
    /// Replace the shown markers with every point belonging to `area_name`
    /// (case-insensitive). Returns how many markers are now shown.
    pub fn show_for_area(&mut self, points: &[PointOfInterest], area_name: &str) -> usize {
        self.clear();
        self.shown = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.belongs_to(area_name))
            .map(|(i, _)| i)
            .collect();
        self.area = Some(area_name.to_string());
        self.shown.len()
    }

    pub fn clear(&mut self) {
        self.shown.clear();
        self.area = None;
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    /// Area the markers were last shown for, if any.
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    /// Shown markers resolved against the point list they were built from.
    pub fn markers<'a>(
        &'a self,
        points: &'a [PointOfInterest],
    ) -> impl Iterator<Item = (usize, &'a PointOfInterest)> + 'a {
        self.shown
            .iter()
            .filter_map(move |&i| points.get(i).map(|p| (i, p)))
    }
}

/// Number of points that would be shown for `area_name`.
pub fn count_for_area(points: &[PointOfInterest], area_name: &str) -> usize {
    points.iter().filter(|p| p.belongs_to(area_name)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(name: &str, area: &str) -> PointOfInterest {
        PointOfInterest {
            name: name.into(),
            area_name: area.into(),
            photo_url: None,
            description: None,
            lon: -68.9,
            lat: 12.1,
        }
    }

    fn points() -> Vec<PointOfInterest> {
        vec![
            poi("Fortkerk", "Willemstad"),
            poi("Sint Anna Basiliek", "willemstad"),
            poi("Sint Willibrordus kerk", "Bandabou"),
        ]
    }

    #[test]
    fn shows_points_matching_area_case_insensitively() {
        let pts = points();
        let mut overlay = MarkerOverlay::default();

        assert_eq!(overlay.show_for_area(&pts, "WILLEMSTAD"), 2);
        let names: Vec<_> = overlay.markers(&pts).map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, ["Fortkerk", "Sint Anna Basiliek"]);

        assert_eq!(overlay.show_for_area(&pts, "willemstad"), 2);
        assert_eq!(overlay.area(), Some("willemstad"));
    }

    #[test]
    fn switching_area_replaces_markers() {
        let pts = points();
        let mut overlay = MarkerOverlay::default();
        overlay.show_for_area(&pts, "Willemstad");
        assert_eq!(overlay.show_for_area(&pts, "Bandabou"), 1);
        let shown: Vec<_> = overlay.markers(&pts).map(|(i, _)| i).collect();
        assert_eq!(shown, [2]);
    }

    #[test]
    fn clear_and_show_are_idempotent_on_empty() {
        let pts = points();
        let mut overlay = MarkerOverlay::default();
        overlay.clear();
        overlay.clear();
        assert!(overlay.is_empty());

        assert_eq!(overlay.show_for_area(&pts, "Nowhere"), 0);
        assert_eq!(overlay.show_for_area(&pts, "Nowhere"), 0);
        assert!(overlay.is_empty());
        assert_eq!(overlay.len(), 0);

        overlay.show_for_area(&pts, "Willemstad");
        overlay.clear();
        assert!(overlay.is_empty());
        assert_eq!(overlay.area(), None);
    }

    #[test]
    fn count_for_area_matches_overlay() {
        let pts = points();
        assert_eq!(count_for_area(&pts, "wIlLeMsTaD"), 2);
        assert_eq!(count_for_area(&pts, "Sint Michiel"), 0);
    }
}
