use ldk_schemas::ValidationError;

/// Clamp-then-snap rule for one decimal optical field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRule {
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

pub const SPH: StepRule = StepRule { step: 0.25, min: -30.0, max: 30.0 };
pub const CYL: StepRule = StepRule { step: 0.25, min: -10.0, max: 10.0 };
pub const BC: StepRule = StepRule { step: 0.1, min: 8.0, max: 9.0 };

pub const AX_MIN: i64 = 0;
pub const AX_MAX: i64 = 180;
pub const DIAMETER_MIN: i64 = 40;
pub const DIAMETER_MAX: i64 = 90;
pub const DIAMETER_STEP: i64 = 5;
pub const QTY_MIN: i64 = 1;
pub const QTY_MAX: i64 = 20;

impl StepRule {
    /// Clamp to `[min, max]`, snap to the nearest multiple of `step`
    /// (ties to even), and round to the precision implied by `step`.
    ///
    /// The result always lies in `[min, max]` and is a multiple of `step`
    /// within float tolerance, provided the range holds at least one
    /// multiple.
    pub fn apply(&self, value: f64) -> f64 {
        let v = value.clamp(self.min, self.max);
        let mut k = (v / self.step).round_ties_even();
        if k * self.step > self.max + 1e-9 {
            k -= 1.0;
        }
        if k * self.step < self.min - 1e-9 {
            k += 1.0;
        }
        let scale = 10f64.powi(self.decimals() as i32);
        // `+ 0.0` folds -0.0 into 0.0 so it never renders as "-0.00".
        (k * self.step * scale).round() / scale + 0.0
    }

    /// Decimal places implied by `step` (0.25 -> 2, 0.1 -> 1, 5 -> 0).
    pub fn decimals(&self) -> usize {
        (0..=6)
            .find(|&d| {
                let scaled = self.step * 10f64.powi(d);
                (scaled - scaled.round()).abs() < 1e-9
            })
            .unwrap_or(6) as usize
    }

    /// Render a normalized value at the rule's precision.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals(), value + 0.0)
    }

    /// Normalize an optional value; absence stays absence.
    pub fn apply_opt(&self, value: Option<f64>) -> Option<f64> {
        value.map(|v| self.apply(v))
    }
}

pub fn clamp_int(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

/// Clamp to `[min, max]` then snap to the nearest multiple of `step`.
pub fn snap_int(value: i64, step: i64, min: i64, max: i64) -> i64 {
    let v = clamp_int(value, min, max);
    let snapped = ((v as f64) / (step as f64)).round() as i64 * step;
    snapped.clamp(min, max)
}

/// Parse a decimal typed into a form field. Empty means absent.
/// Accepts `,` as the decimal separator and the Unicode minus sign.
pub fn parse_optional_decimal(
    field: &'static str,
    text: &str,
) -> Result<Option<f64>, ValidationError> {
    let t = text.trim().replace(',', ".").replace('\u{2212}', "-");
    if t.is_empty() {
        return Ok(None);
    }
    let v: f64 = t.parse().map_err(|_| ValidationError::Unparseable {
        field,
        input: text.to_string(),
    })?;
    if !v.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    Ok(Some(v))
}

/// Parse an integer typed into a form field. Empty means absent.
pub fn parse_optional_int(field: &'static str, text: &str) -> Result<Option<i64>, ValidationError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(None);
    }
    t.parse::<i64>()
        .map(Some)
        .map_err(|_| ValidationError::Unparseable {
            field,
            input: text.to_string(),
        })
}
