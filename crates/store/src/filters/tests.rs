use pretty_assertions::assert_eq;

use super::*;
use crate::model::Station;

fn at(id: u64, state: &str, city: &str, zip: &str) -> Station {
	Station {
		state: Some(state.into()),
		city: Some(city.into()),
		zip_code: Some(zip.into()),
		..Station::new(id)
	}
}

#[test]
fn options_start_with_all_and_are_sorted() {
	let stations = [at(1, "TX", "Austin", "78701"), at(2, "CA", "Fresno", "93650"), at(3, "TX", "Austin", "9021")];
	let mut filters = LocationFilters::default();
	filters.refresh(stations.iter());

	assert_eq!(filters.state.options(), ["All", "CA", "TX"]);
	assert_eq!(filters.city.options(), ["All", "Austin", "Fresno"]);
	assert_eq!(filters.zip_code.options(), ["All", "9021", "78701", "93650"]);
}

#[test]
fn missing_values_are_skipped() {
	let stations = [Station::new(1), at(2, "TX", "", "78701")];
	let mut filters = LocationFilters::default();
	filters.refresh(stations.iter());
	assert_eq!(filters.city.options(), ["All"]);
	assert_eq!(filters.state.options(), ["All", "TX"]);
}

#[test]
fn selection_must_be_an_option() {
	let stations = [at(1, "TX", "Austin", "78701")];
	let mut filters = LocationFilters::default();
	filters.refresh(stations.iter());

	assert!(!filters.state.set_selected("NY"));
	assert_eq!(filters.state.selected(), ALL);
	assert!(filters.state.set_selected("TX"));
	assert!(filters.admits(&stations[0]));
	assert!(!filters.admits(&at(2, "CA", "Fresno", "93650")));
}
