use crate::area::AreaRecord;

/// Case-insensitive substring filter over area names.
///
/// A blank query returns every area. Otherwise the query is matched as typed,
/// surrounding spaces included. Input order is preserved.
pub fn filter_areas<'a>(areas: &'a [AreaRecord], query: &str) -> Vec<&'a AreaRecord> {
    if query.trim().is_empty() {
        return areas.iter().collect();
    }
    let query = query.to_lowercase();
    areas
        .iter()
        .filter(|area| area.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_areas;
    use crate::area::AreaRecord;

    fn areas(names: &[&str]) -> Vec<AreaRecord> {
        names
            .iter()
            .map(|name| AreaRecord {
                name: name.to_string(),
                population: 0,
                households: 0,
                mean_income: 0.0,
            })
            .collect()
    }

    fn names<'a>(list: &[&'a AreaRecord]) -> Vec<&'a str> {
        list.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_full_list_in_order() {
        let all = areas(&["Bandabou", "Sint Michiel", "Willemstad"]);
        assert_eq!(
            names(&filter_areas(&all, "")),
            ["Bandabou", "Sint Michiel", "Willemstad"]
        );
        assert_eq!(filter_areas(&all, "   \t").len(), 3);
    }

    #[test]
    fn matches_substring_ignoring_case() {
        let all = areas(&["Bandabou", "Sint Michiel", "Willemstad"]);
        assert_eq!(names(&filter_areas(&all, "WILL")), ["Willemstad"]);
        assert_eq!(names(&filter_areas(&all, "mi")), ["Sint Michiel"]);
        assert_eq!(
            names(&filter_areas(&all, "n")),
            ["Bandabou", "Sint Michiel"]
        );
        assert!(filter_areas(&all, "xyz").is_empty());
    }

    #[test]
    fn surrounding_spaces_are_part_of_the_query() {
        let all = areas(&["Bandabou", "Banda Ariba", "Sint Michiel"]);
        assert_eq!(names(&filter_areas(&all, "banda ")), ["Banda Ariba"]);
        assert_eq!(names(&filter_areas(&all, " michiel")), ["Sint Michiel"]);
        assert!(filter_areas(&all, " bandabou").is_empty());
    }

    #[test]
    fn stricter_query_is_subset_of_looser_query() {
        let all = areas(&[
            "Bandabou",
            "Banda Ariba",
            "Barber",
            "Sta. Barbara",
            "Willemstad",
        ]);
        let loose = names(&filter_areas(&all, "ba"));
        for strict_query in ["ban", "band", "banda", "banda a"] {
            let strict = names(&filter_areas(&all, strict_query));
            assert!(
                strict.iter().all(|n| loose.contains(n)),
                "{strict_query}: {strict:?} not within {loose:?}"
            );
        }
    }
}
