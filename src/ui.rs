use std::io;
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app::{App, Command, FormField, Mode, Notice, NoticeKind, TaskForm};
use crate::format;
use crate::gateway::TaskGateway;
use crate::task::{Bucket, Task};

const CARD_HEIGHT: u16 = 5;

pub async fn run_app<B: Backend, G: TaskGateway>(
    terminal: &mut Terminal<B>,
    app: &mut App<G>,
) -> io::Result<()> {
    app.reload().await;
    loop {
        terminal.draw(|f| render(f, app))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let command = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => None,
        };
        if app.should_quit {
            return Ok(());
        }
        let Some(command) = command else {
            continue;
        };

        if matches!(command, Command::Reload | Command::Drop(Some(_)) | Command::SubmitForm) {
            app.notice = Some(Notice::info("Syncing..."));
            terminal.draw(|f| render(f, app))?;
            app.notice = None;
        }

        app.execute(command).await;
    }
}

pub fn render<G: TaskGateway>(f: &mut Frame, app: &mut App<G>) {
    let banner = u16::from(app.needs_verification());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(banner),
            Constraint::Min(CARD_HEIGHT + 2),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, rows[0]);
    if banner > 0 {
        let line = Line::from(vec![
            Span::styled(
                "Email not verified. ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Check your inbox for the verification link. [v] resend  [x] dismiss"),
        ]);
        f.render_widget(Paragraph::new(line), rows[1]);
    }
    render_board(f, app, rows[2]);
    render_footer(f, app, rows[3]);

    match &app.mode {
        Mode::Form(form) => render_form(f, form),
        Mode::ConfirmDelete { title, .. } => render_confirm(f, title),
        Mode::Normal => {}
    }
}

fn render_header<G: TaskGateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let who = app
        .user
        .as_ref()
        .map(|u| format!("{} (@{})", u.full_name, u.username))
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::styled("taskdeck", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(who, Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn bucket_color(bucket: Bucket) -> Color {
    match bucket {
        Bucket::Pending => Color::Yellow,
        Bucket::InProgress => Color::Blue,
        Bucket::Completed => Color::Green,
    }
}

fn render_board<G: TaskGateway>(f: &mut Frame, app: &mut App<G>, area: Rect) {
    app.hit_map.clear();

    if let (Some(err), true) = (app.board.load_error(), app.board.tasks().is_empty()) {
        let text = vec![
            Line::styled(
                "Error Loading Tasks",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Line::raw(format::error_message(err)),
            Line::raw(""),
            Line::raw("Press r to try again."),
        ];
        let block = Block::default().borders(Borders::ALL);
        f.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);

    let now = Utc::now();
    let dragged = app.board.dragged_task_id().map(str::to_string);

    for (i, bucket) in Bucket::ALL.into_iter().enumerate() {
        let column = chunks[i];
        app.hit_map.add_column(column, bucket);

        let tasks = app.board.tasks().bucket(bucket);
        let block = Block::default()
            .title(format!("{} ({})", bucket.display_name(), tasks.len()))
            .borders(Borders::ALL)
            .border_style(if app.selected_status == i {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(bucket_color(bucket))
            });
        let inner = block.inner(column);
        f.render_widget(block, column);

        let visible = usize::from((inner.height / CARD_HEIGHT).max(1));
        let offset = if app.selected_status == i && app.selected_task >= visible {
            app.selected_task + 1 - visible
        } else {
            0
        };

        let mut cards = Vec::new();
        for (row, (index, task)) in tasks.iter().enumerate().skip(offset).take(visible).enumerate() {
            let Ok(row) = u16::try_from(row) else {
                break;
            };
            let card = Rect::new(inner.x, inner.y + row * CARD_HEIGHT, inner.width, CARD_HEIGHT)
                .intersection(inner);
            let selected = app.selected_status == i && app.selected_task == index;
            let is_dragged = dragged.as_deref() == Some(task.id.as_str());
            cards.push((card, task.id.clone()));
            render_card(f, task, card, selected, is_dragged, now);
        }
        if tasks.is_empty() {
            f.render_widget(
                Paragraph::new(Line::styled("No tasks", Style::default().fg(Color::DarkGray))),
                inner,
            );
        }
        for (card, id) in cards {
            app.hit_map.add_card(card, &id);
        }
    }
}

fn render_card(
    f: &mut Frame,
    task: &Task,
    area: Rect,
    selected: bool,
    dragged: bool,
    now: chrono::DateTime<Utc>,
) {
    let border = if dragged {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let width = usize::from(area.width.saturating_sub(2));
    let due_style = if format::is_overdue(task.due_date, now) {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let lines = vec![
        Line::styled(
            format::truncate(&task.title, width.saturating_sub(3)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(format::truncate(
            task.description.as_deref().unwrap_or(""),
            width.saturating_sub(3),
        )),
        Line::styled(
            format::due_date_label(task.due_date, &now.with_timezone(&Local)),
            due_style,
        ),
    ];
    let block = Block::default().borders(Borders::ALL).border_style(border);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer<G: TaskGateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let line = match &app.notice {
        Some(Notice {
            kind: NoticeKind::Error,
            text,
        }) => Line::styled(text.clone(), Style::default().fg(Color::Red)),
        Some(Notice { text, .. }) => Line::styled(text.clone(), Style::default().fg(Color::Green)),
        None if app.board.is_dragging() => {
            Line::raw("Dragging: arrows move  space/enter drop  esc cancel")
        }
        None => Line::raw(
            "a new  e edit  d delete  space drag  r refresh  q quit  (mouse: drag cards)",
        ),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_form(f: &mut Frame, form: &TaskForm) {
    let area = centered(f.area(), 70, 14);
    f.render_widget(Clear, area);

    let title = if form.task_id.is_some() {
        "Edit Task"
    } else {
        "Create New Task"
    };
    let field = |name: &str, value: String, which: FormField| {
        let focused = form.focus == which;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{marker}{name:<12}"), style),
            Span::raw(value),
            Span::raw(if focused && which != FormField::Status { "_" } else { "" }),
        ])
    };

    let mut lines = vec![
        field("Title *", form.title.clone(), FormField::Title),
        field("Description", form.description.clone(), FormField::Description),
        field(
            "Status",
            format!("< {} >", form.status.display_name()),
            FormField::Status,
        ),
        field("Due date", form.due.clone(), FormField::Due),
        Line::raw(""),
        Line::styled(
            "Due date: YYYY-MM-DD or YYYY-MM-DD HH:MM (local time)",
            Style::default().fg(Color::DarkGray),
        ),
        Line::styled(
            "tab next field  left/right status  enter save  esc cancel",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::raw(""));
        lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_confirm(f: &mut Frame, title: &str) {
    let area = centered(f.area(), 60, 5);
    f.render_widget(Clear, area);
    let block = Block::default()
        .title("Delete Task")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let text = vec![
        Line::raw(format!("Are you sure you want to delete \"{title}\"?")),
        Line::styled("y confirm, any other key cancels", Style::default().fg(Color::DarkGray)),
    ];
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragController;
    use crate::gateway::fake::{task, FakeGateway};
    use ratatui::backend::TestBackend;

    #[tokio::test]
    async fn draws_three_columns_and_maps_cards() {
        let gateway = FakeGateway::with_tasks(vec![task("A", "pending"), task("C", "completed")]);
        let mut app = App::new(DragController::new(gateway), None);
        app.reload().await;

        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Pending (1)"));
        assert!(screen.contains("In Progress (0)"));
        assert!(screen.contains("Completed (1)"));
        assert!(screen.contains("task A"));

        // First card of the first column sits just inside its border.
        assert_eq!(app.hit_map.card_at(2, 2), Some("A"));
        assert_eq!(app.hit_map.target_at(40, 15), Some("in-progress"));
    }
}
