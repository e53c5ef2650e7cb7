use crate::models::file_entry::Entry;
use crate::models::summary::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    /// Largest first.
    Size,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Size => write!(f, "size"),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            _ => Err(format!("unknown sort key: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub sort: SortKey,
    /// Directories and files in separate sections.
    pub split: bool,
    /// Add disk-size columns.
    pub disk: bool,
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

pub fn format_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let pct = part as f64 * 100.0 / total as f64;
    if pct >= 10.0 || pct == 0.0 {
        format!("{pct:.0}%")
    } else {
        format!("{pct:.1}%")
    }
}

pub fn sort_entries(entries: &mut [&Entry], key: SortKey) {
    entries.sort_by(|a, b| match key {
        SortKey::Name => a.name().cmp(b.name()),
        SortKey::Size => b
            .size()
            .cmp(&a.size())
            .then_with(|| a.name().cmp(b.name())),
    });
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// Pads every column to its widest cell.
fn render_columns(rows: &[Vec<String>], align: &[Align]) -> String {
    let columns = align.len();
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(columns) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate().take(columns) {
            if idx > 0 {
                line.push_str("  ");
            }
            let pad = widths[idx].saturating_sub(cell.chars().count());
            match align[idx] {
                Align::Left => {
                    line.push_str(cell);
                    line.push_str(&" ".repeat(pad));
                }
                Align::Right => {
                    line.push_str(&" ".repeat(pad));
                    line.push_str(cell);
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn entry_table(entries: &[&Entry], summary: &Summary, opts: &ReportOptions) -> String {
    let mut header = vec!["SIZE".to_string(), "%".to_string()];
    let mut align = vec![Align::Right, Align::Right];
    if opts.disk {
        header.extend(["DISK SIZE".to_string(), "DISK %".to_string()]);
        align.extend([Align::Right, Align::Right]);
    }
    header.push("NAME".to_string());
    align.push(Align::Left);

    let mut rows = vec![header];
    for entry in entries {
        let mut row = vec![
            format_bytes(entry.size()),
            format_percent(entry.size(), summary.publish_size),
        ];
        if opts.disk {
            row.push(format_bytes(entry.disk_size()));
            row.push(format_percent(entry.disk_size(), summary.publish_disk_size));
        }
        row.push(entry.display_name());
        rows.push(row);
    }
    render_columns(&rows, &align)
}

pub fn render_summary_block(summary: &Summary) -> String {
    let rows = vec![
        vec!["PKGFILES SUMMARY".to_string(), String::new()],
        vec![
            "Size on Disk with Dependencies".to_string(),
            format_bytes(summary.extracted_disk_size),
        ],
        vec![
            "Size with Dependencies".to_string(),
            format_bytes(summary.extracted_size),
        ],
        vec![
            "Publishable Size on Disk".to_string(),
            format_bytes(summary.publish_disk_size),
        ],
        vec![
            "Publishable Size".to_string(),
            format_bytes(summary.publish_size),
        ],
        vec![
            "Number of Directories".to_string(),
            summary.dir_count().to_string(),
        ],
        vec!["Number of Files".to_string(), summary.file_count().to_string()],
    ];
    render_columns(&rows, &[Align::Left, Align::Right])
}

/// The column report: entry table (or one per section with `split`),
/// then the summary block.
pub fn render_report(summary: &Summary, opts: &ReportOptions) -> String {
    let mut out = String::new();
    let mut sections: Vec<(Option<&str>, Vec<&Entry>)> = if opts.split {
        vec![
            (
                Some("DIRECTORIES"),
                summary.entries.iter().filter(|e| e.is_directory()).collect(),
            ),
            (
                Some("FILES"),
                summary.entries.iter().filter(|e| !e.is_directory()).collect(),
            ),
        ]
    } else {
        vec![(None, summary.entries.iter().collect())]
    };

    for (title, entries) in sections.iter_mut() {
        sort_entries(entries.as_mut_slice(), opts.sort);
        if let Some(title) = *title {
            out.push_str(title);
            out.push('\n');
        }
        out.push_str(&entry_table(entries.as_slice(), summary, opts));
        out.push('\n');
    }
    out.push_str(&render_summary_block(summary));
    out
}

/// Relative paths of the published files, one per line, in name order.
pub fn render_file_list(entries: &[Entry]) -> String {
    let mut files: Vec<&Entry> = entries.iter().filter(|e| !e.is_directory()).collect();
    sort_entries(&mut files, SortKey::Name);
    files
        .iter()
        .map(|e| format!("{}\n", e.name()))
        .collect()
}

pub fn render_json(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
