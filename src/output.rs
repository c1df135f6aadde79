use crate::standing::StandingStatus;

const RESET: &str = "\u{001b}[0m";

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.color_enabled {
            format!("{}{}{}", code, s, RESET)
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint("\u{001b}[32m", s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint("\u{001b}[31m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.paint("\u{001b}[90m", s)
    }

    pub fn status(&self, status: StandingStatus) -> String {
        match status {
            StandingStatus::Ahead => self.green(status.as_str()),
            StandingStatus::Behind => self.red(status.as_str()),
            StandingStatus::OnTrack => status.as_str().to_string(),
        }
    }
}

/// Integral values print without decimals, others with at most two.
pub fn fmt_amount(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn fmt_signed(v: f64) -> String {
    if v > 0.0 {
        format!("+{}", fmt_amount(v))
    } else {
        fmt_amount(v)
    }
}

pub fn fmt_percent(p: f64) -> String {
    format!("{}%", p.round() as i64)
}

/// Bar of `width` cells, clamped to 0..=100 percent.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let p = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((p / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

/// Terminal columns taken by `s`: CJK, Hangul, fullwidth forms and most
/// emoji take two. ANSI color sequences take none.
pub fn display_width(s: &str) -> usize {
    let mut in_escape = false;
    s.chars()
        .filter(|c| {
            if in_escape {
                in_escape = *c != 'm';
                return false;
            }
            if *c == '\u{001b}' {
                in_escape = true;
                return false;
            }
            true
        })
        .map(|c| {
            let cp = c as u32;
            let wide = matches!(cp,
                0x1100..=0x115F
                | 0x2E80..=0x303E
                | 0x3041..=0x33FF
                | 0x3400..=0x4DBF
                | 0x4E00..=0x9FFF
                | 0xAC00..=0xD7A3
                | 0xF900..=0xFAFF
                | 0xFF00..=0xFF60
                | 0xFFE0..=0xFFE6
                | 0x1F300..=0x1F64F
                | 0x1F900..=0x1F9FF
                | 0x20000..=0x2FFFD);
            if wide {
                2
            } else {
                1
            }
        })
        .sum()
}

fn pad_right(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(pad))
}

pub fn render_simple_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(headers.len());
    let mut widths = vec![0usize; columns];
    for (i, h) in headers.iter().enumerate() {
        widths[i] = display_width(h);
    }
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let render_line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad_right(c, widths[i]))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_line(headers.to_vec())];
    for row in rows.iter() {
        lines.push(render_line(row.iter().map(|s| s.as_str()).collect()));
    }
    lines.join("\n")
}
