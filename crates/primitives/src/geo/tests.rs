use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn viewport_key_rounds_coordinates() {
	let view = MapView::new(LatLng::new(37.774_912_3, -122.419_416), 12.0);
	assert_eq!(view.viewport_key(4).as_str(), "37.7749,-122.4194,12");
}

#[test]
fn viewport_key_ignores_sub_precision_jitter() {
	let a = MapView::new(LatLng::new(37.77491, -122.41941), 12.0);
	let b = MapView::new(LatLng::new(37.77494, -122.41944), 12.0);
	assert_eq!(a.viewport_key(4), b.viewport_key(4));
}

#[test]
fn viewport_key_distinguishes_zoom() {
	let a = MapView::new(LatLng::new(10.0, 10.0), 12.0);
	let b = MapView::new(LatLng::new(10.0, 10.0), 13.0);
	assert_ne!(a.viewport_key(4), b.viewport_key(4));
}

#[test]
fn viewport_key_folds_negative_zero() {
	let a = MapView::new(LatLng::new(-0.000_01, 0.0), 3.0);
	let b = MapView::new(LatLng::new(0.000_01, 0.0), 3.0);
	assert_eq!(a.viewport_key(4), b.viewport_key(4));
	assert_eq!(a.viewport_key(4).as_str(), "0.0000,0.0000,3");
}

#[test]
fn bounds_enclosing_covers_all_points() {
	let points = [LatLng::new(1.0, 5.0), LatLng::new(-2.0, 3.0), LatLng::new(4.0, -1.0)];
	let bounds = Bounds::enclosing(points).unwrap();
	assert_eq!(bounds, Bounds::new(LatLng::new(-2.0, -1.0), LatLng::new(4.0, 5.0)));
	assert!(points.iter().all(|p| bounds.contains(*p)));
	assert_eq!(Bounds::enclosing([]), None);
}

struct Pin(Option<LatLng>);

impl Positioned for Pin {
	fn position(&self) -> Option<LatLng> {
		self.0
	}
}

#[test]
fn outside_skips_unpositioned_items() {
	let bounds = Bounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
	let pins = [Pin(Some(LatLng::new(5.0, 5.0))), Pin(None), Pin(Some(LatLng::new(20.0, 5.0)))];
	let outside = bounds.outside(&pins);
	assert_eq!(outside.len(), 1);
	assert_eq!(outside[0].0, Some(LatLng::new(20.0, 5.0)));
}

#[test]
fn validity_rejects_out_of_range() {
	assert!(LatLng::new(90.0, -180.0).is_valid());
	assert!(!LatLng::new(91.0, 0.0).is_valid());
	assert!(!LatLng::new(0.0, f64::NAN).is_valid());
}

proptest! {
	#[test]
	fn equal_rounded_views_share_keys(lat in -89.0f64..89.0, lng in -179.0f64..179.0, zoom in 0u8..20) {
		let view = MapView::new(LatLng::new(lat, lng), f64::from(zoom));
		let key = view.viewport_key(4);
		prop_assert_eq!(view.viewport_key(4), key.clone());
		let reparsed: Vec<f64> = key.as_str().split(',').map(|p| p.parse().unwrap()).collect();
		prop_assert!((reparsed[0] - lat).abs() <= 0.000_051);
		prop_assert!((reparsed[1] - lng).abs() <= 0.000_051);
	}
}
