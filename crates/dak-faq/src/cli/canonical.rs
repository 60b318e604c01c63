//! Canonical resource commands

use super::output::{OutputFormat, Printer, format_success, format_warning};
use crate::service::FaqService;
use anyhow::{Result, bail};
use dak_faq_canonical::Resolved;
use serde::Serialize;

fn report_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{}", format_warning(warning));
    }
}

/// Print a resolved value, or fail when nothing could be obtained
fn print_resolved<T: Serialize>(printer: &Printer, url: &str, resolved: Resolved<T>) -> Result<()> {
    report_warnings(&resolved.warnings);
    match resolved.value {
        Some(value) => printer.serialize(&value),
        None => bail!("canonical resource {} is unavailable", url),
    }
}

pub fn known(service: &FaqService, printer: &Printer) -> Result<()> {
    printer.serialize(&service.list_known_canonicals())
}

pub async fn get(service: &FaqService, printer: &Printer, url: &str) -> Result<()> {
    print_resolved(printer, url, service.get_canonical_resource(url).await)
}

pub async fn expand(service: &FaqService, printer: &Printer, url: &str) -> Result<()> {
    let resolved = service.expand_value_set(url).await;
    if printer.format() == OutputFormat::Table {
        // The code list is what a reader wants to see
        return print_resolved(printer, url, resolved.map(|expansion| expansion.codes));
    }
    print_resolved(printer, url, resolved)
}

pub async fn cached(service: &FaqService, printer: &Printer) -> Result<()> {
    printer.serialize(&service.list_cached_canonicals().await)
}

pub async fn stats(service: &FaqService, printer: &Printer) -> Result<()> {
    printer.serialize(&service.cache_stats().await)
}

pub async fn clear(service: &FaqService) -> Result<()> {
    service.clear_canonical_cache().await?;
    eprintln!("{}", format_success("canonical cache cleared"));
    Ok(())
}
