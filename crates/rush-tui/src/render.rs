use crate::app::{App, ScreenState};
use crate::theme::parse_hex;
use chrono::Local;
use crossterm::{
    cursor::{Hide, MoveTo},
    execute,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use rush_core::{Backend, Category, ChoiceResult, Period, RoundPhase, ScoreEntry};
use std::io;

const BAR_WIDTH: u16 = 40;

pub fn render(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let (term_width, term_height) = terminal::size()?;

    execute!(
        stdout,
        Hide,
        SetBackgroundColor(app.theme.bg),
        Clear(ClearType::All)
    )?;

    match app.screen_state {
        ScreenState::Setup => render_setup_screen(stdout, app, term_width)?,
        ScreenState::Playing => render_round_screen(stdout, app, term_width)?,
        ScreenState::Result => render_result_screen(stdout, app, term_width, term_height)?,
        ScreenState::Leaderboard => render_leaderboard_screen(stdout, app, term_width, term_height)?,
    }

    render_status_line(stdout, app, term_height)?;

    if let Some(ref err) = app.error {
        render_error(stdout, app, err, term_width, term_height)?;
    }
    if let Some(ref msg) = app.message {
        render_message(stdout, app, msg, term_width)?;
    }

    Ok(())
}

/// Tenths of a second as `S.s`
fn tenths(value: u32) -> String {
    format!("{}.{}", value / 10, value % 10)
}

fn centered_x(term_width: u16, text: &str) -> u16 {
    term_width.saturating_sub(text.chars().count() as u16) / 2
}

fn render_title(stdout: &mut io::Stdout, app: &App, title: &str, term_width: u16) -> io::Result<()> {
    let title = format!("═══ {} ═══", title);
    execute!(
        stdout,
        MoveTo(centered_x(term_width, &title), 1),
        SetForegroundColor(app.theme.key),
        Print(&title)
    )
}

fn render_controls(stdout: &mut io::Stdout, app: &App, y: u16, controls: &[(&str, &str)]) -> io::Result<()> {
    execute!(stdout, MoveTo(4, y))?;
    for (key, label) in controls {
        execute!(
            stdout,
            SetForegroundColor(app.theme.key),
            Print(key),
            SetForegroundColor(app.theme.info),
            Print(format!(" {}   ", label))
        )?;
    }
    Ok(())
}

fn render_setup_screen(stdout: &mut io::Stdout, app: &App, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "RUSH", term_width)?;

    execute!(
        stdout,
        MoveTo(4, 4),
        SetForegroundColor(theme.info),
        Print("Name: "),
        SetForegroundColor(theme.fg),
        Print(&app.name_input),
        SetForegroundColor(theme.key),
        Print("_")
    )?;

    execute!(
        stdout,
        MoveTo(4, 6),
        SetForegroundColor(theme.info),
        Print("Game:")
    )?;
    for (i, category) in Category::ALL.iter().enumerate() {
        let selected = *category == app.category;
        let (marker, color) = if selected {
            ("▶ ", theme.key)
        } else {
            ("  ", theme.fg)
        };
        execute!(
            stdout,
            MoveTo(6, 7 + i as u16),
            SetForegroundColor(color),
            Print(format!("{}{}", marker, category.title()))
        )?;
    }

    let bell = if app.profile.haptics_enabled { "bell on" } else { "bell off" };
    render_controls(
        stdout,
        app,
        8 + Category::ALL.len() as u16,
        &[
            ("Enter", "start"),
            ("↑↓", "game"),
            ("Tab", "leaderboard"),
            ("F2", bell),
            ("F3", "theme"),
            ("Esc", "quit"),
        ],
    )
}

fn render_round_screen(stdout: &mut io::Stdout, app: &App, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    let controller = &app.controller;
    let Some(session) = controller.session() else {
        return Ok(());
    };

    render_title(stdout, app, session.category.title(), term_width)?;

    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.fg),
        Print(format!("Score {:<6}", session.score)),
        SetForegroundColor(theme.info),
        Print(format!("Streak {:<4}", session.streak)),
        Print(session.player.as_str())
    )?;

    // Time bar
    let filled = (session.clock.fraction().min(1.0) * BAR_WIDTH as f32).round() as u16;
    let bar_color = if controller.in_fever() {
        theme.fever
    } else {
        theme.success
    };
    execute!(
        stdout,
        MoveTo(4, 5),
        SetForegroundColor(bar_color),
        Print("█".repeat(filled as usize)),
        SetForegroundColor(theme.border),
        Print("░".repeat(BAR_WIDTH.saturating_sub(filled) as usize)),
        SetForegroundColor(theme.fg),
        Print(format!(" {}s", session.clock.display()))
    )?;
    if controller.in_fever() {
        execute!(
            stdout,
            SetForegroundColor(theme.fever),
            Print("  FEVER")
        )?;
    }

    match controller.phase() {
        RoundPhase::Active => render_choices(stdout, app)?,
        RoundPhase::Bonus => render_recall(stdout, app)?,
        RoundPhase::Idle | RoundPhase::Ended => {}
    }

    render_controls(
        stdout,
        app,
        16,
        &[("1-9", "pick"), ("f", "finish"), ("Esc", "abandon")],
    )
}

fn render_choices(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let theme = &app.theme;
    let Some(set) = app.controller.current_set() else {
        return Ok(());
    };

    let prompt_color = if set.tier().is_rare() { theme.rare } else { theme.fg };
    execute!(
        stdout,
        MoveTo(4, 7),
        SetForegroundColor(prompt_color),
        Print(&set.prompt)
    )?;

    let feedback = app.controller.feedback();
    let reveal = feedback.is_some();
    let mut x = 4;
    for (i, item) in set.items().iter().enumerate() {
        let highlight = reveal && set.is_correct(i);
        x = render_option(stdout, app, x, 9, i, &item.display_value, highlight)?;
    }

    if let Some(result) = feedback {
        render_feedback(stdout, app, result)?;
    }
    Ok(())
}

/// Draws `[n] value`; hex values become a colour swatch. Returns the next x.
fn render_option(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    y: u16,
    index: usize,
    value: &str,
    highlight: bool,
) -> io::Result<u16> {
    let theme = &app.theme;
    let label_bg = if highlight { theme.selected_bg } else { theme.bg };
    execute!(
        stdout,
        MoveTo(x, y),
        SetBackgroundColor(label_bg),
        SetForegroundColor(theme.key),
        Print(format!("[{}] ", index + 1))
    )?;

    let width = match parse_hex(value) {
        Some(swatch) => {
            execute!(stdout, SetBackgroundColor(swatch), Print("      "))?;
            6
        }
        None => {
            let color = if highlight { theme.success } else { theme.fg };
            execute!(stdout, SetForegroundColor(color), Print(value))?;
            // Emoji take two cells
            value.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum::<u16>()
        }
    };
    execute!(stdout, SetBackgroundColor(theme.bg))?;
    Ok(x + 4 + width + 3)
}

fn render_feedback(stdout: &mut io::Stdout, app: &App, result: ChoiceResult) -> io::Result<()> {
    let theme = &app.theme;
    let (text, color): (String, Color) = match result {
        ChoiceResult::Correct {
            tier,
            points,
            time_bonus,
            streak,
        } => {
            let mut text = format!("+{}", points);
            if time_bonus > 0 {
                text.push_str(&format!("  +{}s", tenths(time_bonus)));
            }
            if streak >= 2 {
                text.push_str(&format!("  x{} streak", streak));
            }
            let color = if tier.is_rare() { theme.rare } else { theme.success };
            (text, color)
        }
        ChoiceResult::Incorrect { penalty } => (format!("-{}s", tenths(penalty)), theme.error),
        ChoiceResult::Recall { .. } | ChoiceResult::Rejected(_) => return Ok(()),
    };
    execute!(
        stdout,
        MoveTo(4, 12),
        SetForegroundColor(color),
        Print(text)
    )
}

fn render_recall(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let theme = &app.theme;
    let Some(stage) = app.controller.recall_stage() else {
        return Ok(());
    };

    execute!(
        stdout,
        MoveTo(4, 7),
        SetForegroundColor(theme.rare),
        Print(format!("BONUS +{}  ", stage.bonus)),
        SetForegroundColor(theme.fg),
        Print(&stage.question)
    )?;

    let mut x = 4;
    for (i, option) in stage.options.iter().enumerate() {
        let highlight = stage.is_answered() && i == stage.answer;
        x = render_option(stdout, app, x, 9, i, option, highlight)?;
    }

    if let Some(correct) = stage.result {
        let (text, color) = if correct {
            (format!("Correct! +{}", stage.bonus), theme.success)
        } else {
            (format!("It was {}", stage.correct_option()), theme.error)
        };
        execute!(
            stdout,
            MoveTo(4, 12),
            SetForegroundColor(color),
            Print(text)
        )?;
    }
    Ok(())
}

fn render_result_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "ROUND OVER", term_width)?;

    let Some(ref outcome) = app.outcome else {
        return Ok(());
    };

    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.key),
        Print(format!("{}  {}", outcome.category.title(), outcome.player)),
        MoveTo(4, 5),
        SetForegroundColor(theme.fg),
        Print(format!("Score        {}", outcome.score)),
        MoveTo(4, 6),
        SetForegroundColor(theme.info),
        Print(format!(
            "Correct {}   Missed {}   Best streak {}   Bonus {}",
            outcome.correct, outcome.incorrect, outcome.best_streak, outcome.bonus_awarded
        ))
    )?;

    let list_y = 8;
    match app.ranking {
        Some(ref ranking) => {
            if let Some(rank) = ranking.rank_of(outcome.player.as_str()) {
                execute!(
                    stdout,
                    MoveTo(4, list_y),
                    SetForegroundColor(theme.success),
                    Print(format!("Rank #{}", rank))
                )?;
            }
            let max_rows = term_height.saturating_sub(list_y + 6) as usize;
            let rows = ranking.compact(app.compact_limit().min(max_rows));
            render_entries(stdout, app, rows, list_y + 2, false)?;
        }
        None if app.is_loading() => {
            execute!(
                stdout,
                MoveTo(4, list_y),
                SetForegroundColor(theme.info),
                Print("Saving score...")
            )?;
        }
        None => {}
    }

    render_controls(
        stdout,
        app,
        term_height.saturating_sub(3),
        &[
            ("Enter", "play again"),
            ("Tab", "leaderboard"),
            ("x", "dismiss"),
            ("Esc", "menu"),
            ("q", "quit"),
        ],
    )
}

fn render_entries(
    stdout: &mut io::Stdout,
    app: &App,
    entries: &[ScoreEntry],
    y: u16,
    with_dates: bool,
) -> io::Result<()> {
    let theme = &app.theme;
    execute!(
        stdout,
        MoveTo(4, y),
        SetForegroundColor(theme.fg),
        Print(format!("{:>4}  {:<14}{:>7}", "Rank", "Player", "Score"))
    )?;
    if with_dates {
        execute!(stdout, Print(format!("  {:<16}", "Date")))?;
    }
    execute!(
        stdout,
        MoveTo(4, y + 1),
        SetForegroundColor(theme.border),
        Print("─".repeat(if with_dates { 47 } else { 29 }))
    )?;

    if entries.is_empty() {
        execute!(
            stdout,
            MoveTo(4, y + 2),
            SetForegroundColor(theme.info),
            Print("No scores yet")
        )?;
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        let mine = entry.player_name == app.profile.player_name;
        let color = if mine { theme.key } else { theme.fg };
        execute!(
            stdout,
            MoveTo(4, y + 2 + i as u16),
            SetForegroundColor(color),
            Print(format!("{:>4}  {:<14}{:>7}", i + 1, entry.player_name, entry.score))
        )?;
        if with_dates {
            let when = entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
            execute!(
                stdout,
                SetForegroundColor(theme.info),
                Print(format!("  {}", when))
            )?;
        }
    }
    Ok(())
}

fn render_leaderboard_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "LEADERBOARD", term_width)?;

    // Category filter
    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.info),
        Print("◀ ")
    )?;
    for category in Category::ALL {
        let color = if category == app.category {
            theme.key
        } else {
            theme.border
        };
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!(" {} ", category.title()))
        )?;
    }
    execute!(stdout, SetForegroundColor(theme.info), Print(" ▶"))?;

    // Period filter
    execute!(stdout, MoveTo(4, 4))?;
    for period in Period::ALL {
        let color = if period == app.period {
            theme.key
        } else {
            theme.border
        };
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!(" {} ", period.label()))
        )?;
    }

    match app.ranking {
        Some(ref ranking) => {
            let max_rows = term_height.saturating_sub(12) as usize;
            let rows = &ranking.entries[..ranking.len().min(max_rows)];
            render_entries(stdout, app, rows, 6, true)?;
            let source = match ranking.source {
                Backend::Remote => "online",
                Backend::Local => "this device",
            };
            execute!(
                stdout,
                MoveTo(4, term_height.saturating_sub(4)),
                SetForegroundColor(theme.info),
                Print(format!("Scores from {}", source))
            )?;
        }
        None => {
            let text = if app.is_loading() { "Loading..." } else { "" };
            execute!(
                stdout,
                MoveTo(4, 6),
                SetForegroundColor(theme.info),
                Print(text)
            )?;
        }
    }

    render_controls(
        stdout,
        app,
        term_height.saturating_sub(3),
        &[
            ("←→", "game"),
            ("Tab", "period"),
            ("r", "refresh"),
            ("x", "dismiss"),
            ("Esc", "back"),
        ],
    )
}

fn render_status_line(stdout: &mut io::Stdout, app: &App, term_height: u16) -> io::Result<()> {
    let status = app.status();
    let text = match status.remote {
        Some(_) if status.using_fallback => "Leaderboard: offline, saving on this device",
        Some(_) => "Leaderboard: online",
        None => "Leaderboard: this device only",
    };
    let color = if status.using_fallback {
        app.theme.error
    } else {
        app.theme.border
    };
    execute!(
        stdout,
        MoveTo(4, term_height.saturating_sub(1)),
        SetForegroundColor(color),
        Print(text)
    )
}

fn render_error(
    stdout: &mut io::Stdout,
    app: &App,
    err: &str,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let padded = format!("  {}  (x to dismiss)  ", err);
    execute!(
        stdout,
        MoveTo(centered_x(term_width, &padded), term_height.saturating_sub(2)),
        SetForegroundColor(app.theme.bg),
        SetBackgroundColor(app.theme.error),
        Print(&padded),
        SetBackgroundColor(app.theme.bg)
    )
}

fn render_message(stdout: &mut io::Stdout, app: &App, msg: &str, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    let padded = format!("  {}  ", msg);
    execute!(
        stdout,
        MoveTo(centered_x(term_width, &padded), 0),
        SetForegroundColor(theme.fg),
        SetBackgroundColor(theme.selected_bg),
        Print(&padded),
        SetBackgroundColor(theme.bg)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenths() {
        assert_eq!(tenths(30), "3.0");
        assert_eq!(tenths(5), "0.5");
        assert_eq!(tenths(125), "12.5");
    }

    #[test]
    fn test_centered_x() {
        assert_eq!(centered_x(20, "abcd"), 8);
        assert_eq!(centered_x(2, "abcd"), 0);
    }
}
