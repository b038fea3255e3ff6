//! Data generators for benchmarks

use fake::faker::address::en::CityName;
use fake::faker::name::en::*;
use fake::Fake;
use rand::Rng;
use tally::common::Document;
use tally::doc;

/// Generate distinct sequence names, e.g. `orders_0`, `orders_1`, ...
pub fn generate_sequence_names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Generate records without an id field, ready for `assign_id`
pub fn generate_records(count: usize) -> Vec<Document> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let city: String = CityName().fake();
            let age: i64 = rng.gen_range(18..80);

            doc! {
                firstName: (first_name),
                lastName: (last_name),
                city: (city),
                age: (age)
            }
        })
        .collect()
}

/// Pick `count` names at random from `names`, with repetition
pub fn pick_names(names: &[String], count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| names[rng.gen_range(0..names.len())].clone())
        .collect()
}
