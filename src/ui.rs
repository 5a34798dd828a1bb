use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::{Session, SessionOutcome, SessionSnapshot};

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &Session {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(snapshot) = self.snapshot() {
            render_typing(&snapshot, area, buf);
        } else if let (Some(outcome), Some(stats)) = (self.outcome(), self.stats()) {
            render_results(outcome, stats, area, buf);
        } else {
            let waiting = Paragraph::new("press enter to start")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            waiting.render(area, buf);
        }
    }
}

fn render_typing(snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green_bold = bold.fg(Color::Green);
    let red_bold = bold.fg(Color::Red);
    let dim_bold = bold.add_modifier(Modifier::DIM);
    let cursor_style = dim_bold.add_modifier(Modifier::UNDERLINED);

    let mut spans: Vec<Span> = vec![];

    for word in &snapshot.context_before {
        spans.push(Span::styled(format!("{word} "), dim_bold));
    }

    // Correctly typed prefix of the current word
    spans.push(Span::styled(snapshot.input.clone(), green_bold));

    // Buffered mistakes overlay the rest of the word
    if !snapshot.errors.is_empty() {
        spans.push(Span::styled(
            snapshot
                .errors
                .chars()
                .map(|c| if c == ' ' { '·' } else { c })
                .collect::<String>(),
            red_bold,
        ));
    }

    let typed = snapshot.input.chars().count();
    let mut rest = snapshot.current_word.chars().skip(typed);
    if let Some(next_char) = rest.next() {
        spans.push(Span::styled(next_char.to_string(), cursor_style));
    }
    spans.push(Span::styled(rest.collect::<String>(), dim_bold));

    for word in &snapshot.context_after {
        spans.push(Span::styled(format!(" {word}"), dim_bold));
    }

    let line = Line::from(spans);
    let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let fits_one_line = line_width <= max_chars_per_line as usize;

    let timer_lines = if snapshot.timeout_secs > 0.0 { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(timer_lines),
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    if snapshot.timeout_secs > 0.0 {
        let remaining = (snapshot.timeout_secs - snapshot.elapsed_secs).max(0.0);
        let timer = Paragraph::new(Span::styled(format!("{remaining:.1}"), dim_bold))
            .alignment(Alignment::Center);
        timer.render(chunks[1], buf);
    }

    let prompt = Paragraph::new(line)
        .alignment(if fits_one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    prompt.render(chunks[2], buf);

    let footer = Paragraph::new(Span::styled(
        format!(
            "{} words · {} errors",
            snapshot.word_count, snapshot.error_count
        ),
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    footer.render(chunks[4], buf);
}

fn render_results(
    outcome: SessionOutcome,
    stats: &crate::stats::SessionStats,
    area: Rect,
    buf: &mut Buffer,
) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let (title, title_style) = match outcome {
        SessionOutcome::Completed => ("text completed", bold.fg(Color::Green)),
        SessionOutcome::TimedOut => ("time is up", bold.fg(Color::Yellow)),
        SessionOutcome::Aborted => ("wrong key - session over", bold.fg(Color::Red)),
    };

    let mut lines = vec![
        Line::from(Span::styled(title, title_style)),
        Line::default(),
        Line::from(format!(
            "{} words · {} characters · {} errors",
            stats.word_count, stats.character_count, stats.error_count
        )),
        Line::from(format!("{:.1}s elapsed", stats.elapsed_secs())),
    ];

    if stats.elapsed_secs() > 0.0 {
        lines.push(Line::from(format!(
            "{:.1} wpm · {:.1} cpm",
            stats.wpm(),
            stats.cpm()
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        if outcome.persists() {
            "result saved"
        } else {
            "result discarded"
        },
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines.push(Line::from(Span::styled(
        "(r)estart / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    )));

    let block_height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(block_height),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    body.render(chunks[1], buf);
}
