//! Display formatting for samples

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Formats a byte count as gigabytes with two decimals, e.g. `"1.50 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GIB)
}

pub fn format_percent(percent: i32) -> String {
    format!("{}%", percent)
}

pub fn cpu_line(percent: i32) -> String {
    format!("CPU: {}", format_percent(percent))
}

/// `None` means the memory query failed for this tick.
pub fn total_ram_line(total: Option<u64>) -> String {
    match total {
        Some(bytes) => format!("RAM: {}", format_bytes(bytes)),
        None => "RAM: --".to_string(),
    }
}

pub fn used_ram_line(used: Option<u64>) -> String {
    match used {
        Some(bytes) => format!("Used: {}", format_bytes(bytes)),
        None => "Used: --".to_string(),
    }
}
