// CSV export and import planning

use std::collections::HashMap;
use std::fmt::Display;

use crate::error::DeviceError;
use crate::models::{BatchSummary, Device, MacAddress, RenameRequest};

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding for the Chinese headers.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const EXPORT_HEADER: [&str; 5] = ["MAC地址", "设备名称", "IP地址", "连接类型", "新名称"];

const MAC_HEADERS: &[&str] = &["MAC地址", "mac_address", "mac"];
const NEW_NAME_HEADERS: &[&str] = &["新名称", "new_name"];
const CURRENT_NAME_HEADERS: &[&str] = &["设备名称", "device_name", "name"];

fn csv_err(e: impl Display) -> DeviceError {
    DeviceError::Csv(e.to_string())
}

/// One row per device; the new-name column is left blank for the user to fill in.
pub fn export(devices: &[Device]) -> Result<Vec<u8>, DeviceError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(BOM.to_vec());
    writer.write_record(EXPORT_HEADER).map_err(csv_err)?;
    for d in devices {
        writer
            .write_record([
                d.mac_address.as_str(),
                d.name.as_str(),
                d.ip_address.as_str(),
                d.connection_type.as_str(),
                "",
            ])
            .map_err(csv_err)?;
    }
    writer.into_inner().map_err(csv_err)
}

/// Renames derived from an uploaded CSV, plus how every row was classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub updates: Vec<RenameRequest>,
    pub summary: BatchSummary,
}

/// Classifies each row against `on_record` (MAC -> name currently on the router):
/// - bad or missing MAC: invalid
/// - new name given: update, or unchanged when it matches the record
/// - only current name given: update when the record holds a different name, else unchanged
/// - neither: skipped
pub fn plan_import(
    data: &[u8],
    on_record: &HashMap<MacAddress, String>,
) -> Result<ImportPlan, DeviceError> {
    let data = data.strip_prefix(BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mac_cols = columns(&headers, MAC_HEADERS);
    if mac_cols.is_empty() {
        return Err(DeviceError::Csv(format!(
            "no MAC column found, expected one of {}",
            MAC_HEADERS.join(", ")
        )));
    }
    let new_cols = columns(&headers, NEW_NAME_HEADERS);
    let current_cols = columns(&headers, CURRENT_NAME_HEADERS);

    let mut plan = ImportPlan::default();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        plan.summary.total_devices += 1;

        let Ok(mac) = MacAddress::parse(first_non_empty(&record, &mac_cols)) else {
            plan.summary.invalid_count += 1;
            continue;
        };
        let recorded = on_record.get(&mac).map(String::as_str);
        let new_name = first_non_empty(&record, &new_cols);
        let current_name = first_non_empty(&record, &current_cols);

        let wanted = if !new_name.is_empty() {
            (recorded != Some(new_name)).then_some(new_name)
        } else if !current_name.is_empty() {
            recorded
                .is_some_and(|r| r != current_name)
                .then_some(current_name)
        } else {
            plan.summary.skipped_count += 1;
            continue;
        };

        match wanted.map(|name| RenameRequest::new(mac, name)) {
            Some(Ok(request)) => plan.updates.push(request),
            Some(Err(_)) => plan.summary.skipped_count += 1,
            None => plan.summary.unchanged_count += 1,
        }
    }
    plan.summary.updates_attempted = plan.updates.len();
    Ok(plan)
}

fn columns(headers: &csv::StringRecord, accepted: &[&str]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| accepted.iter().any(|a| h.eq_ignore_ascii_case(a)))
        .map(|(i, _)| i)
        .collect()
}

fn first_non_empty<'r>(record: &'r csv::StringRecord, cols: &[usize]) -> &'r str {
    cols.iter()
        .filter_map(|&i| record.get(i))
        .find(|v| !v.is_empty())
        .unwrap_or("")
}
