//! Human-readable unit formatting

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Format millicores as `"<n> millicores"` below one core, `"<n> cores"` above
pub fn format_cpu(millicores: f64) -> String {
    if millicores >= 1000.0 {
        format!("{:.2} cores", millicores / 1000.0)
    } else {
        format!("{:.2} millicores", millicores)
    }
}

/// Format bytes in the largest binary unit up to GB
pub fn format_memory(bytes: f64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{:.2} B", bytes)
    }
}
