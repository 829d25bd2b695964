use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::settings::NumericBounds;

pub fn random_bool(rng: &mut dyn RngCore) -> bool {
    rng.random_bool(0.5)
}

/// Any Unicode scalar value, no charset restriction.
pub fn random_char(rng: &mut dyn RngCore) -> char {
    rng.random::<char>()
}

pub fn current_date() -> NaiveDate {
    Local::now().date_naive()
}

// Sub-second precision is dropped so values survive a store round trip.
pub fn current_date_time() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn current_offset_date_time() -> DateTime<FixedOffset> {
    Local::now().fixed_offset().trunc_subsecs(0)
}

pub fn current_time() -> NaiveTime {
    Local::now().time().trunc_subsecs(0)
}

/// Uniform double within the bounds; `None` when the bounds are empty or
/// their span is not finite.
pub fn random_double(bounds: NumericBounds, rng: &mut dyn RngCore) -> Option<f64> {
    if bounds.is_empty() || !bounds.is_finite() {
        return None;
    }
    Some(rng.random_range(bounds.min..=bounds.max))
}

pub fn random_decimal(bounds: NumericBounds, rng: &mut dyn RngCore) -> Option<Decimal> {
    random_double(bounds, rng).and_then(Decimal::from_f64)
}

/// Uniform integer drawn directly within the integral part of the bounds.
pub fn random_integer(
    bounds: NumericBounds,
    type_min: i64,
    type_max: i64,
    rng: &mut dyn RngCore,
) -> Option<i64> {
    let (min, max) = bounds.integral(type_min, type_max)?;
    Some(rng.random_range(min..=max))
}

pub fn random_string(length: usize, rng: &mut dyn RngCore) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

pub fn random_blob(size: usize, rng: &mut dyn RngCore) -> Vec<u8> {
    let mut bytes = vec![0_u8; size];
    rng.fill_bytes(&mut bytes);
    bytes
}

pub fn pick<'a, T>(items: &'a [T], rng: &mut dyn RngCore) -> Option<&'a T> {
    items.choose(rng)
}
