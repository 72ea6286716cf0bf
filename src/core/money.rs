//! Money helpers.
//!
//! Every monetary value in the engine is a signed integer number of cents.
//! Floating point only appears transiently: tip percentages are rational, so
//! tip arithmetic goes through `f64` and is rounded straight back to cents.

/// Signed amount in 1/100 of the currency unit.
pub type Cents = i64;

/// Rounds half toward positive infinity (`floor(x + 0.5)`).
///
/// `2.5` rounds to `3` and `-2.5` rounds to `-2`. This is the single rounding
/// rule used for tips, base shares, split increments and back-derived subtotals.
///
/// `NaN` becomes `0`; infinities and values beyond the `Cents` range clamp to
/// `Cents::MIN` or `Cents::MAX`. Use [`checked_round_half_up`] where such an
/// input has to be handled instead.
#[must_use]
pub fn round_half_up(value: f64) -> Cents {
    checked_round_half_up(value).unwrap_or(if value.is_nan() {
        0
    } else if value.is_sign_negative() {
        Cents::MIN
    } else {
        Cents::MAX
    })
}

/// Like [`round_half_up`], but `None` for `NaN`, infinities and results that
/// do not fit in `Cents`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn checked_round_half_up(value: f64) -> Option<Cents> {
    let rounded = (value + 0.5).floor();
    // i64::MAX as f64 is 2^63, one past the largest representable value
    (rounded.is_finite() && rounded >= Cents::MIN as f64 && rounded < Cents::MAX as f64)
        .then_some(rounded as Cents)
}

/// Tip on `subtotal` at `tip_percent`, rounded to cents.
///
/// A zero subtotal or a zero percentage yields exactly zero.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn tip_amount(subtotal: Cents, tip_percent: f64) -> Cents {
    if subtotal == 0 || tip_percent == 0.0 {
        return 0;
    }
    round_half_up(subtotal as f64 * tip_percent / 100.0)
}

/// Formats cents for display, e.g. `-1234` becomes `"-12.34"`.
#[must_use]
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
