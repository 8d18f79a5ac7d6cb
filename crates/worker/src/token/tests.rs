use super::*;

#[test]
fn generations_start_at_one_and_are_shared_by_clones() {
	let clock = GenerationClock::new();
	assert_eq!(clock.current(), 0);
	assert_eq!(clock.next(), 1);
	let other = clock.clone();
	assert_eq!(other.next(), 2);
	assert_eq!(clock.current(), 2);
}
