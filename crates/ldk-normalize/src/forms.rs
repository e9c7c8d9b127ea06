//! Form validators: raw input -> normalized draft, or a `ValidationError`
//! with nothing written.

use ldk_schemas::{
    ClientDraft, ClientInput, MeridianItemDraft, MeridianItemInput, MklOrderDraft, MklOrderInput,
    ValidationError, UNNAMED_PRODUCT,
};

use crate::numeric::{
    clamp_int, snap_int, AX_MAX, AX_MIN, BC, CYL, DIAMETER_MAX, DIAMETER_MIN, DIAMETER_STEP,
    QTY_MAX, QTY_MIN, SPH,
};
use crate::phone::only_digits;

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let t = value.trim();
    if t.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(t.to_string())
}

fn finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NonFinite(field)),
        other => Ok(other),
    }
}

fn required_phone(value: &str) -> Result<String, ValidationError> {
    let digits = only_digits(value);
    if digits.is_empty() {
        return Err(ValidationError::MissingField("phone"));
    }
    Ok(digits)
}

pub fn validate_mkl_order(input: &MklOrderInput) -> Result<MklOrderDraft, ValidationError> {
    let fio = required("fio", &input.fio)?;
    let phone_digits = required_phone(&input.phone)?;
    let product_name = required("product_name", &input.product_name)?;

    let sph = finite("sph", input.sph)?.ok_or(ValidationError::MissingField("sph"))?;
    let cyl = finite("cyl", input.cyl)?;
    let bc = finite("bc", input.bc)?;

    Ok(MklOrderDraft {
        fio,
        phone_digits,
        product_name,
        sph: SPH.apply(sph),
        cyl: CYL.apply_opt(cyl),
        ax: input.ax.map(|a| clamp_int(a, AX_MIN, AX_MAX) as i32),
        bc: BC.apply_opt(bc),
        qty: clamp_int(input.qty, QTY_MIN, QTY_MAX) as i32,
        comment: input.comment.trim().to_string(),
    })
}

pub fn validate_meridian_item(
    input: &MeridianItemInput,
) -> Result<MeridianItemDraft, ValidationError> {
    let product_name = match input.product_name.trim() {
        "" => UNNAMED_PRODUCT.to_string(),
        t => t.to_string(),
    };
    let sph = finite("sph", input.sph)?;
    let cyl = finite("cyl", input.cyl)?;

    Ok(MeridianItemDraft {
        product_name,
        sph: SPH.apply_opt(sph),
        cyl: CYL.apply_opt(cyl),
        ax: input.ax.map(|a| clamp_int(a, AX_MIN, AX_MAX) as i32),
        diameter: input
            .diameter
            .map(|d| snap_int(d, DIAMETER_STEP, DIAMETER_MIN, DIAMETER_MAX) as i32),
        qty: clamp_int(input.qty, QTY_MIN, QTY_MAX) as i32,
    })
}

pub fn validate_client(input: &ClientInput) -> Result<ClientDraft, ValidationError> {
    Ok(ClientDraft {
        full_name: required("full_name", &input.full_name)?,
        phone_digits: required_phone(&input.phone)?,
    })
}

pub fn validate_product_name(name: &str) -> Result<String, ValidationError> {
    required("name", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkl_input() -> MklOrderInput {
        MklOrderInput {
            fio: "  Иванов Иван ".to_string(),
            phone: "+7 (912) 345-67-89".to_string(),
            product_name: "Air Optix Aqua".to_string(),
            sph: Some(-1.30),
            cyl: None,
            ax: Some(200),
            bc: Some(8.64),
            qty: 0,
            comment: " позвонить ".to_string(),
        }
    }

    #[test]
    fn mkl_order_is_normalized() {
        let d = validate_mkl_order(&mkl_input()).unwrap();
        assert_eq!(d.fio, "Иванов Иван");
        assert_eq!(d.phone_digits, "79123456789");
        assert_eq!(d.sph, -1.25);
        assert_eq!(d.cyl, None);
        assert_eq!(d.ax, Some(180));
        assert_eq!(d.bc, Some(8.6));
        assert_eq!(d.qty, 1);
        assert_eq!(d.comment, "позвонить");
    }

    #[test]
    fn mkl_order_requires_identity_product_and_sph() {
        let mut i = mkl_input();
        i.fio = "   ".into();
        assert_eq!(validate_mkl_order(&i), Err(ValidationError::MissingField("fio")));

        let mut i = mkl_input();
        i.phone = "n/a".into();
        assert_eq!(validate_mkl_order(&i), Err(ValidationError::MissingField("phone")));

        let mut i = mkl_input();
        i.product_name = String::new();
        assert_eq!(
            validate_mkl_order(&i),
            Err(ValidationError::MissingField("product_name"))
        );

        let mut i = mkl_input();
        i.sph = None;
        assert_eq!(validate_mkl_order(&i), Err(ValidationError::MissingField("sph")));

        let mut i = mkl_input();
        i.cyl = Some(f64::NAN);
        assert_eq!(validate_mkl_order(&i), Err(ValidationError::NonFinite("cyl")));
    }

    #[test]
    fn meridian_item_defaults_blank_product_and_snaps_diameter() {
        let d = validate_meridian_item(&MeridianItemInput {
            product_name: "  ".into(),
            sph: Some(2.1),
            cyl: Some(-0.3),
            ax: Some(-5),
            diameter: Some(72),
            qty: 99,
        })
        .unwrap();
        assert_eq!(d.product_name, UNNAMED_PRODUCT);
        assert_eq!(d.sph, Some(2.0));
        assert_eq!(d.cyl, Some(-0.25));
        assert_eq!(d.ax, Some(0));
        assert_eq!(d.diameter, Some(70));
        assert_eq!(d.qty, 20);
    }

    #[test]
    fn client_requires_name_and_digits() {
        assert!(validate_client(&ClientInput {
            full_name: "Петров".into(),
            phone: "8 912 000 00 00".into()
        })
        .is_ok());
        assert_eq!(
            validate_client(&ClientInput { full_name: "".into(), phone: "1".into() }),
            Err(ValidationError::MissingField("full_name"))
        );
        assert_eq!(validate_product_name("  "), Err(ValidationError::MissingField("name")));
    }
}
