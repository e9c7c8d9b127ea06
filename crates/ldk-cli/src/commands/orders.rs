//! `ldk orders`: tab-separated listing and MKL order entry from form text.

use anyhow::Result;
use ldk_normalize::{parse_optional_decimal, parse_optional_int};
use ldk_schemas::{
    Catalog, LifecycleStatus, MeridianFilter, MeridianStatus, MklFilter, MklOrderInput,
    MklStatus,
};

use super::open_desk;

pub async fn list(catalog: &str, status: Option<&str>, query: Option<String>) -> Result<()> {
    let catalog = Catalog::parse(catalog)?;
    let desk = open_desk().await?;

    match catalog {
        Catalog::Mkl => {
            let status = status.map(MklStatus::parse).transpose()?;
            let orders = desk.list_mkl_orders(&MklFilter { status, query }).await?;
            println!("count={}", orders.len());
            for o in orders {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    o.id,
                    o.status.as_str(),
                    o.fio,
                    o.product_name,
                    o.qty,
                    o.status_changed_at.to_rfc3339()
                );
            }
        }
        Catalog::Meridian => {
            let status = status.map(MeridianStatus::parse).transpose()?;
            let orders = desk.list_meridian_orders(&MeridianFilter { status }).await?;
            println!("count={}", orders.len());
            for s in orders {
                println!(
                    "{}\t{}\t{}\titems={}\t{}",
                    s.order.id,
                    s.order.status.as_str(),
                    s.order.title,
                    s.item_count,
                    s.order.status_changed_at.to_rfc3339()
                );
            }
        }
    }
    Ok(())
}

/// MKL order fields exactly as typed.
pub struct MklForm {
    pub fio: String,
    pub phone: String,
    pub product: String,
    pub sph: String,
    pub cyl: String,
    pub ax: String,
    pub bc: String,
    pub qty: String,
    pub comment: String,
}

pub async fn add_mkl(form: MklForm) -> Result<()> {
    let input = MklOrderInput {
        fio: form.fio,
        phone: form.phone,
        product_name: form.product,
        sph: parse_optional_decimal("sph", &form.sph)?,
        cyl: parse_optional_decimal("cyl", &form.cyl)?,
        ax: parse_optional_int("ax", &form.ax)?,
        bc: parse_optional_decimal("bc", &form.bc)?,
        qty: parse_optional_int("qty", &form.qty)?.unwrap_or(1),
        comment: form.comment,
    };

    let desk = open_desk().await?;
    let o = desk.create_mkl_order(&input).await?;
    println!(
        "id={} status={} sph={:.2} qty={}",
        o.id,
        o.status.as_str(),
        o.sph,
        o.qty
    );
    Ok(())
}
