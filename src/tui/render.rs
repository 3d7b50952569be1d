use std::borrow::Cow;

use super::state::AppState;
use super::{Focus, Ui};
use crate::analysis::result::{AnalysisResult, Category, Sentiment};
use crate::engine::session::Stage;
use crate::publish::PublishTarget;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const CURSOR: char = '\u{258f}';

pub fn draw(f: &mut Frame, state: &AppState, ui: &Ui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0], ui.spinner_frame);
    draw_topic(f, ui, chunks[1]);

    let show_studio = state.analysis.is_some()
        || state.stage == Stage::ArticleSelected
        || raw_output(state).is_some();
    if show_studio {
        let feed_height = (state.articles.len() as u16 * 2 + 2).min(14);
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(feed_height), Constraint::Min(10)])
            .split(chunks[2]);
        draw_feed(f, state, ui, body[0]);
        draw_studio(f, state, ui, body[1]);
    } else {
        draw_feed(f, state, ui, chunks[2]);
    }

    draw_status(f, state, chunks[3]);
    draw_footer(f, ui, chunks[4]);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let activity = match &state.busy {
        Some(label) => {
            let ch = SPINNER_FRAMES[(spinner_frame as usize) % SPINNER_FRAMES.len()];
            Span::styled(format!(" {} {}", ch, label), Style::default().fg(Color::Cyan))
        }
        None => Span::styled(" READY", Style::default().fg(Color::Green)),
    };

    let key_status = if state.has_credential {
        Span::styled("OK", Style::default().fg(Color::Green))
    } else {
        Span::styled("MISSING", Style::default().fg(Color::Red))
    };

    let auto = if state.auto_process {
        Span::styled("ON", Style::default().fg(Color::Green))
    } else {
        Span::styled("OFF", Style::default().fg(Color::DarkGray))
    };

    let line = Line::from(vec![
        Span::raw(format!(" Model: {} | Auto: ", state.model)),
        auto,
        Span::raw(" | Key: "),
        key_status,
        Span::raw(format!(" | Stage: {} | Up: {}", state.stage.label(), state.uptime())),
        activity,
    ]);

    let block = Block::default()
        .title(Span::styled(
            " Aletheia AI \u{00b7} News Intelligence Dashboard ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn focus_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default().title(title).borders(Borders::ALL).border_style(style)
}

fn draw_topic(f: &mut Frame, ui: &Ui, area: Rect) {
    let focused = ui.focus == Focus::Topic;
    let text = if focused {
        format!("{}{}", ui.topic, CURSOR)
    } else {
        ui.topic.clone()
    };
    let para = Paragraph::new(text).block(focus_block(" Search Topic ".to_string(), focused));
    f.render_widget(para, area);
}

fn draw_feed(f: &mut Frame, state: &AppState, ui: &Ui, area: Rect) {
    let focused = ui.focus == Focus::Feed;
    let title = match &state.topic {
        Some(topic) => format!(" Incoming Feed: {} ", title_case(topic)),
        None => " Incoming Feed ".to_string(),
    };
    let block = focus_block(title, focused);

    if state.articles.is_empty() {
        let hint = if state.stage == Stage::Idle {
            "Type a topic and press Enter to fetch news"
        } else {
            "No articles found for this topic"
        };
        let para = Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(para, area);
        return;
    }

    let inner_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = state
        .articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let active = state.selected == Some(i);
            let marker = if active { "\u{25b6} " } else { "  " };
            let title_style = if active {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            let mut byline = vec![Span::styled(
                format!("  {}", article.byline()),
                Style::default().fg(Color::DarkGray),
            )];
            if let Some(badge) = state.triage.get(&article.link) {
                byline.push(Span::styled(
                    format!("  [{} \u{00b7} {} \u{00b7} {}%]", badge.category, badge.sentiment, badge.truth_score),
                    Style::default().fg(sentiment_color(&badge.sentiment)),
                ));
            }

            ListItem::new(Text::from(vec![
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(
                        truncate_with_ellipsis(&article.title, inner_width.saturating_sub(2)).into_owned(),
                        title_style,
                    ),
                ]),
                Line::from(byline),
            ]))
        })
        .collect();

    let highlight = if focused {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut list_state = ListState::default();
    list_state.select(Some(ui.cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_studio(f: &mut Frame, state: &AppState, ui: &Ui, area: Rect) {
    let block = Block::default().title(" Editor Studio ").borders(Borders::ALL);

    let Some((_, result)) = &state.analysis else {
        if let (None, Some(raw)) = (&state.busy, raw_output(state)) {
            return draw_raw_output(f, raw, ui.raw_scroll, area);
        }
        let (msg, color) = if state.busy.is_some() {
            ("AI is gazing into the data...", Color::Cyan)
        } else {
            ("Analysis failed. Press Enter on the article to retry.", Color::Red)
        };
        let para = Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(color))))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(para, area);
        return;
    };

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4)])
        .split(inner);

    draw_insights(f, result, rows[0]);
    draw_form(f, ui, rows[1]);
}

/// Verbatim model reply from a failed extraction, scrollable with PgUp/PgDn.
fn draw_raw_output(f: &mut Frame, raw: &str, scroll: u16, area: Rect) {
    let lines: Vec<Line> = raw.lines().map(|l| Line::from(l.to_string())).collect();
    let block = Block::default()
        .title(" Raw model output (unparsed) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(block);
    f.render_widget(para, area);
}

fn raw_output(state: &AppState) -> Option<&str> {
    state.error.as_ref().and_then(|e| e.raw.as_deref())
}

fn draw_insights(f: &mut Frame, result: &AnalysisResult, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ])
        .split(area);

    let caption = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(Color::DarkGray)));

    let category_color = if Category::parse(result.category()).is_some() {
        Color::White
    } else {
        Color::Yellow
    };
    f.render_widget(
        Paragraph::new(vec![
            caption("CATEGORY"),
            Line::from(Span::styled(result.category().to_string(), Style::default().fg(category_color))),
        ]),
        cols[0],
    );

    f.render_widget(
        Paragraph::new(vec![
            caption("SENTIMENT"),
            Line::from(Span::styled(
                result.sentiment().to_string(),
                Style::default()
                    .fg(sentiment_color(result.sentiment()))
                    .add_modifier(Modifier::BOLD),
            )),
        ]),
        cols[1],
    );

    let score = result.truth_score();
    let gauge = Gauge::default()
        .block(Block::default().title("Credibility Score"))
        .gauge_style(Style::default().fg(score_color(score)))
        .percent(score.clamp(0, 100) as u16)
        .label(format!("{}%", score));
    f.render_widget(gauge, cols[2]);

    f.render_widget(
        Paragraph::new(vec![
            caption("AI ANALYSIS"),
            Line::from(result.fact_check_reason().to_string()),
        ])
        .wrap(Wrap { trim: true }),
        cols[3],
    );
}

fn draw_form(f: &mut Frame, ui: &Ui, area: Rect) {
    let Some(form) = &ui.form else { return };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(cols[1]);

    draw_text_area(f, " Blog / Website Draft ", &form.blog, ui.focus == Focus::Blog, cols[0]);
    draw_text_area(f, " Social Media Post ", &form.social, ui.focus == Focus::Social, right[0]);

    let focused = ui.focus == Focus::Targets;
    let lines: Vec<Line> = PublishTarget::ALL
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let mark = if form.targets.contains(target) { "[x]" } else { "[ ]" };
            let style = if focused && i == ui.target_cursor {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!(" {} {}", mark, target.label()), style))
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(focus_block(" Publish to ".to_string(), focused)),
        right[1],
    );
}

fn draw_text_area(f: &mut Frame, title: &str, text: &str, focused: bool, area: Rect) {
    let content = if focused {
        format!("{}{}", text, CURSOR)
    } else {
        text.to_string()
    };
    let para = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(focus_block(title.to_string(), focused));
    f.render_widget(para, area);
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    if let Some(err) = &state.error {
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(&err.message, inner_width).into_owned(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        if err.raw.is_some() {
            lines.push(Line::from(Span::styled(
                "Raw model output shown in Editor Studio [PgUp/PgDn] scroll",
                Style::default().fg(Color::DarkGray),
            )));
        }
    } else if let Some(confirmation) = &state.confirmation {
        lines.push(Line::from(Span::styled(
            confirmation.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }

    let room = visible.saturating_sub(lines.len());
    let skip = state.logs.len().saturating_sub(room);
    for entry in state.logs.iter().skip(skip) {
        let color = match entry.level.as_str() {
            "ERROR" => Color::Red,
            "WARN" => Color::Yellow,
            _ => Color::Gray,
        };
        let text = format!("{} {}", entry.time, entry.message);
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(&text, inner_width).into_owned(),
            Style::default().fg(color),
        )));
    }

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Status ").borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_footer(f: &mut Frame, ui: &Ui, area: Rect) {
    let keys: &[(&str, &str)] = match ui.focus {
        Focus::Topic => &[("[Enter]", " fetch  "), ("[Tab]", " feed  "), ("[Ctrl-C]", " quit  ")],
        Focus::Feed => &[
            ("[j/k]", " move  "),
            ("[a/Enter]", " analyze  "),
            ("[/]", " search  "),
            ("[e]", " edit  "),
            ("[m]", " model  "),
            ("[t]", " auto  "),
            ("[q]", " quit  "),
        ],
        Focus::Blog | Focus::Social => &[
            ("[Tab]", " next  "),
            ("[Ctrl-P]", " approve & publish  "),
            ("[Esc]", " feed  "),
        ],
        Focus::Targets => &[
            ("[j/k]", " move  "),
            ("[Space]", " toggle  "),
            ("[Ctrl-P]", " approve & publish  "),
            ("[Esc]", " feed  "),
        ],
    };
    let mut spans = vec![Span::raw(" ")];
    for (k, label) in keys {
        spans.push(Span::styled(*k, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(*label));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn sentiment_color(sentiment: &str) -> Color {
    match Sentiment::parse(sentiment) {
        Some(Sentiment::Positive) => Color::Green,
        Some(Sentiment::Negative) => Color::Red,
        _ => Color::Yellow,
    }
}

fn score_color(score: i64) -> Color {
    if score >= 70 {
        Color::Green
    } else if score >= 40 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// "artificial intelligence" -> "Artificial Intelligence"
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::Article;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_very_small_width() {
        assert_eq!(truncate_with_ellipsis("hello", 2), "..");
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
    }

    #[test]
    fn test_truncate_multibyte_chars() {
        // Must not panic when truncation lands inside a multi-byte char
        let s = "Café prices — a guide";
        let result = truncate_with_ellipsis(s, 8);
        assert_eq!(result, "Café ...");
        assert!(result.chars().count() <= 8);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("artificial intelligence"), "Artificial Intelligence");
        assert_eq!(title_case("  NASA  budget "), "Nasa Budget");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_sentiment_colors() {
        assert_eq!(sentiment_color("Positive"), Color::Green);
        assert_eq!(sentiment_color("negative"), Color::Red);
        assert_eq!(sentiment_color("Neutral"), Color::Yellow);
        assert_eq!(sentiment_color("Mixed"), Color::Yellow);
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_draw_idle_screen() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let state = AppState::new(false);
        let ui = Ui::new("Artificial Intelligence".to_string());
        terminal.draw(|f| draw(f, &state, &ui)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("News Intelligence Dashboard"));
        assert!(text.contains("Artificial Intelligence"));
        assert!(text.contains("MISSING"));
        assert!(text.contains("Type a topic and press Enter"));
    }

    #[test]
    fn test_draw_raw_output_in_full() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut state = AppState::new(true);
        state.stage = Stage::ArticleSelected;
        state.articles = vec![Article {
            title: "Chip export rules".to_string(),
            source: "Wire".to_string(),
            published: String::new(),
            summary: String::new(),
            link: "https://news.example/chips".to_string(),
        }];
        state.selected = Some(0);
        let raw = "Here is my analysis:\n{\n  category: Technology,\n  sentiment: Neutral,\n  truth_score: 60,\n  fact_check_reason: LAST_REASON\n}\nHope that helps.";
        state.error = Some(crate::tui::state::ErrorNotice {
            message: "Analysis failed: model returned malformed JSON".to_string(),
            raw: Some(raw.to_string()),
        });

        let mut ui = Ui::new(String::new());
        ui.refresh(&state);
        terminal.draw(|f| draw(f, &state, &ui)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Raw model output"));
        assert!(text.contains("Here is my analysis:"));
        assert!(text.contains("truth_score: 60"));
        assert!(text.contains("fact_check_reason: LAST_REASON"));
        assert!(text.contains("Hope that helps."));
        assert!(text.contains("Analysis failed: model returned malformed JSON"));
    }

    #[test]
    fn test_draw_studio_with_analysis() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut state = AppState::new(true);
        state.stage = Stage::DraftReady;
        state.topic = Some("space".to_string());
        state.articles = vec![Article {
            title: "Probe reaches Europa".to_string(),
            source: "ESA".to_string(),
            published: "Tue, 07 Oct 2025".to_string(),
            summary: String::new(),
            link: "https://news.example/europa".to_string(),
        }];
        state.selected = Some(0);
        let result = match serde_json::json!({
            "category": "Science",
            "sentiment": "Positive",
            "truth_score": 91,
            "fact_check_reason": "Agency source",
            "blog_draft": "Europa draft",
            "social_draft": "#Europa"
        }) {
            serde_json::Value::Object(m) => AnalysisResult::from_map(m),
            _ => unreachable!(),
        };
        state.analysis = Some(("https://news.example/europa".to_string(), result));

        let mut ui = Ui::new("space".to_string());
        ui.refresh(&state);
        terminal.draw(|f| draw(f, &state, &ui)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Incoming Feed: Space"));
        assert!(text.contains("Probe reaches Europa"));
        assert!(text.contains("Editor Studio"));
        assert!(text.contains("Science"));
        assert!(text.contains("91%"));
        assert!(text.contains("Europa draft"));
        assert!(text.contains("[x] Twitter/X") || text.contains("[ ] Twitter/X"));
    }
}
