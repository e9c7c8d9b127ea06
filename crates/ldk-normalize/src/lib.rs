//! ldk-normalize
//!
//! Phone canonicalization/display and optical-field normalization, plus the
//! form validators that turn raw inputs into store-ready drafts.
//!
//! Pure deterministic logic. No IO.

mod forms;
mod numeric;
mod phone;

pub use forms::{
    validate_client, validate_meridian_item, validate_mkl_order, validate_product_name,
};
pub use numeric::{
    clamp_int, parse_optional_decimal, parse_optional_int, snap_int, StepRule, AX_MAX, AX_MIN,
    BC, CYL, DIAMETER_MAX, DIAMETER_MIN, DIAMETER_STEP, QTY_MAX, QTY_MIN, SPH,
};
pub use phone::{format_phone_display, only_digits};
