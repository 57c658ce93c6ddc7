use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::auth::AuthService;
use crate::drag::{DragController, DropOutcome};
use crate::error::ApiError;
use crate::format;
use crate::gateway::TaskGateway;
use crate::task::{Bucket, NewTask, Task, TaskPatch};
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Status,
    Due,
}

impl FormField {
    const ORDER: [FormField; 4] = [
        FormField::Title,
        FormField::Description,
        FormField::Status,
        FormField::Due,
    ];

    fn step(self, forward: bool) -> Self {
        let i = FormField::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let len = FormField::ORDER.len();
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        FormField::ORDER[next]
    }
}

/// Create or edit form. `task_id` is set when editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub task_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: Bucket,
    pub due: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn create(status: Bucket) -> Self {
        Self {
            task_id: None,
            title: String::new(),
            description: String::new(),
            status,
            due: String::new(),
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            task_id: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.bucket().unwrap_or(Bucket::Pending),
            due: format::due_input_value(task.due_date, &Local),
            focus: FormField::Title,
            error: None,
        }
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Due => Some(&mut self.due),
            FormField::Status => None,
        }
    }

    fn cycle_status(&mut self, forward: bool) {
        let i = self.status.index();
        let next = if forward { (i + 1) % 3 } else { (i + 2) % 3 };
        self.status = Bucket::from_index(next).unwrap_or(Bucket::Pending);
    }

    pub fn to_new_task(&self) -> Result<NewTask, ApiError> {
        let due_date = format::parse_due_input(&self.due, &Local).map_err(ApiError::Validation)?;
        NewTask {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            status: self.status,
            due_date,
        }
        .validated()
    }

    /// Every field is sent so that clearing one clears it on the server.
    pub fn to_patch(&self) -> Result<TaskPatch, ApiError> {
        let due_date = format::parse_due_input(&self.due, &Local).map_err(ApiError::Validation)?;
        TaskPatch {
            title: Some(self.title.clone()),
            description: Some(Some(self.description.clone())),
            status: Some(self.status),
            due_date: Some(due_date),
        }
        .validated()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Form(TaskForm),
    ConfirmDelete { task_id: String, title: String },
}

/// Work the event handlers cannot do synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Drop(Option<String>),
    SubmitForm,
    Delete(String),
    ResendVerification,
}

/// Screen regions from the last draw, for mouse hit testing. Cards are
/// checked before columns.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    cards: Vec<(Rect, String)>,
    columns: Vec<(Rect, Bucket)>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.cards.clear();
        self.columns.clear();
    }

    pub fn add_card(&mut self, area: Rect, task_id: &str) {
        self.cards.push((area, task_id.to_string()));
    }

    pub fn add_column(&mut self, area: Rect, bucket: Bucket) {
        self.columns.push((area, bucket));
    }

    pub fn card_at(&self, x: u16, y: u16) -> Option<&str> {
        self.cards
            .iter()
            .find(|(area, _)| contains(*area, x, y))
            .map(|(_, id)| id.as_str())
    }

    /// The drag-and-drop id under the pointer: a task id or a bucket name.
    pub fn target_at(&self, x: u16, y: u16) -> Option<&str> {
        self.card_at(x, y).or_else(|| {
            self.columns
                .iter()
                .find(|(area, _)| contains(*area, x, y))
                .map(|(_, bucket)| bucket.as_str())
        })
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

pub struct App<G> {
    pub board: DragController<G>,
    pub user: Option<User>,
    pub selected_status: usize,
    pub selected_task: usize,
    pub mode: Mode,
    pub notice: Option<Notice>,
    pub show_banner: bool,
    pub hit_map: HitMap,
    pub should_quit: bool,
    auth: Option<AuthService>,
    pressed: Option<(String, u16, u16)>,
}

impl<G: TaskGateway> App<G> {
    pub fn new(board: DragController<G>, user: Option<User>) -> Self {
        Self {
            board,
            user,
            selected_status: 0,
            selected_task: 0,
            mode: Mode::Normal,
            notice: None,
            show_banner: true,
            hit_map: HitMap::default(),
            should_quit: false,
            auth: None,
            pressed: None,
        }
    }

    /// Enables the verification resend from the banner.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthService) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn selected_bucket(&self) -> Bucket {
        Bucket::from_index(self.selected_status).unwrap_or(Bucket::Pending)
    }

    pub fn selected(&self) -> Option<&Task> {
        self.board
            .tasks()
            .get(self.selected_bucket(), self.selected_task)
    }

    pub fn needs_verification(&self) -> bool {
        self.show_banner && self.user.as_ref().is_some_and(|u| !u.is_verified)
    }

    fn select_task(&mut self, task_id: &str) {
        if let Some((bucket, index)) = self.board.tasks().locate(task_id) {
            self.selected_status = bucket.index();
            self.selected_task = index;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.board.tasks().bucket(self.selected_bucket()).len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match self.mode {
            Mode::Form(_) => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
            Mode::Normal if self.board.is_dragging() => self.handle_drag_key(key),
            Mode::Normal => self.handle_board_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<Command> {
        let Mode::ConfirmDelete { task_id, .. } = std::mem::replace(&mut self.mode, Mode::Normal)
        else {
            return None;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Command::Delete(task_id)),
            _ => None,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<Command> {
        self.notice = None;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('r') => return Some(Command::Reload),
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.mode = Mode::Form(TaskForm::create(self.selected_bucket()));
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected() {
                    self.mode = Mode::Form(TaskForm::edit(task));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.selected() {
                    self.mode = Mode::ConfirmDelete {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                    };
                }
            }
            KeyCode::Char('v') if self.needs_verification() => {
                return Some(Command::ResendVerification)
            }
            KeyCode::Char('x') => self.show_banner = false,
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected().map(|t| t.id.clone()) {
                    self.board.start(&id);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_status = self.selected_status.saturating_sub(1);
                self.clamp_selection();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected_status = (self.selected_status + 1).min(Bucket::ALL.len() - 1);
                self.clamp_selection();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_task += 1;
                self.clamp_selection();
            }
            _ => {}
        }
        None
    }

    /// Keyboard drag: arrows hover, space or enter drops, esc cancels.
    fn handle_drag_key(&mut self, key: KeyEvent) -> Option<Command> {
        let task_id = self.board.dragged_task_id()?.to_string();
        let (bucket, index) = self.board.tasks().locate(&task_id)?;
        let over = match key.code {
            KeyCode::Esc => {
                self.board.cancel();
                self.select_task(&task_id);
                return None;
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                return Some(Command::Drop(Some(bucket.as_str().to_string())))
            }
            KeyCode::Left | KeyCode::Char('h') => bucket
                .index()
                .checked_sub(1)
                .and_then(Bucket::from_index)
                .map(|b| b.as_str().to_string()),
            KeyCode::Right | KeyCode::Char('l') => {
                Bucket::from_index(bucket.index() + 1).map(|b| b.as_str().to_string())
            }
            KeyCode::Up | KeyCode::Char('k') => index
                .checked_sub(1)
                .and_then(|i| self.board.tasks().get(bucket, i))
                .map(|t| t.id.clone()),
            KeyCode::Down | KeyCode::Char('j') => self
                .board
                .tasks()
                .get(bucket, index + 1)
                .map(|t| t.id.clone()),
            _ => None,
        };
        if let Some(over) = over {
            self.board.hover(&over);
            self.select_task(&task_id);
        }
        None
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Command> {
        let Mode::Form(form) = &mut self.mode else {
            return None;
        };
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => return Some(Command::SubmitForm),
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.step(true),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.step(false),
            KeyCode::Left if form.focus == FormField::Status => form.cycle_status(false),
            KeyCode::Right | KeyCode::Char(' ') if form.focus == FormField::Status => {
                form.cycle_status(true)
            }
            KeyCode::Backspace => {
                if let Some(field) = form.field_mut() {
                    field.pop();
                }
                form.error = None;
            }
            KeyCode::Char(c) => {
                if let Some(field) = form.field_mut() {
                    field.push(c);
                }
                form.error = None;
            }
            _ => {}
        }
        None
    }

    /// Press selects; moving with the button held starts the gesture;
    /// release drops on whatever is under the pointer.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<Command> {
        if self.mode != Mode::Normal {
            return None;
        }
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = self.hit_map.card_at(x, y).map(str::to_string) {
                    self.select_task(&id);
                    self.pressed = Some((id, x, y));
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if !self.board.is_dragging() {
                    match &self.pressed {
                        Some((id, px, py)) if (*px, *py) != (x, y) => {
                            let id = id.clone();
                            self.board.start(&id);
                        }
                        _ => return None,
                    }
                }
                if let Some(over) = self.hit_map.target_at(x, y).map(str::to_string) {
                    self.board.hover(&over);
                    if let Some(id) = self.board.dragged_task_id().map(str::to_string) {
                        self.select_task(&id);
                    }
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pressed = None;
                if self.board.is_dragging() {
                    Some(Command::Drop(self.hit_map.target_at(x, y).map(str::to_string)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Reload => self.reload().await,
            Command::Drop(over) => self.drop_dragged(over).await,
            Command::SubmitForm => self.submit_form().await,
            Command::Delete(task_id) => self.delete(&task_id).await,
            Command::ResendVerification => self.resend_verification().await,
        }
    }

    async fn resend_verification(&mut self) {
        let Some(email) = self.user.as_ref().map(|u| u.email.clone()) else {
            return;
        };
        let Some(auth) = &self.auth else {
            self.notice = Some(Notice::error(
                "Cannot resend from here, run `taskdeck resend-verification`",
            ));
            return;
        };
        self.notice = Some(match auth.resend_verification(&email).await {
            Ok(_) => Notice::info("Verification email sent! Please check your inbox."),
            Err(err) => {
                warn!(error = %err, "resend verification failed");
                Notice::error(format!("Failed to send email: {}", format::error_message(&err)))
            }
        });
    }

    pub async fn reload(&mut self) {
        match self.board.reload().await {
            Ok(()) => {
                let hidden = self.board.tasks().excluded();
                if hidden > 0 {
                    self.notice = Some(Notice::info(format!(
                        "{hidden} task(s) with an unknown status are hidden"
                    )));
                }
            }
            Err(err) => self.notice = Some(Notice::error(format::error_message(&err))),
        }
        self.clamp_selection();
    }

    async fn drop_dragged(&mut self, over: Option<String>) {
        let outcome = self.board.end(over.as_deref()).await;
        debug!(?outcome, "drop finished");
        match outcome {
            DropOutcome::Persisted { task_id, status } => {
                self.select_task(&task_id);
                self.notice = Some(Notice::info(format!("Moved to {}", status.display_name())));
            }
            DropOutcome::Rejected { task_id, error, .. } => {
                self.select_task(&task_id);
                self.notice = Some(Notice::error(format!(
                    "Failed to update task: {}",
                    format::error_message(&error)
                )));
            }
            DropOutcome::Reverted | DropOutcome::Ignored => {}
        }
        if let Some(err) = self.board.load_error() {
            self.notice = Some(Notice::error(format::error_message(err)));
        }
        self.clamp_selection();
    }

    async fn submit_form(&mut self) {
        let Mode::Form(form) = &self.mode else {
            return;
        };
        let result = match &form.task_id {
            None => match form.to_new_task() {
                Ok(input) => self.board.gateway().create(input).await.map(|_| "Task created"),
                Err(err) => Err(err),
            },
            Some(id) => match form.to_patch() {
                Ok(patch) => self
                    .board
                    .gateway()
                    .update(id, patch)
                    .await
                    .map(|_| "Task updated"),
                Err(err) => Err(err),
            },
        };
        match result {
            Ok(message) => {
                info!(outcome = message, "form submitted");
                self.mode = Mode::Normal;
                self.notice = Some(Notice::info(message));
                self.reload().await;
            }
            Err(err) => {
                if let Mode::Form(form) = &mut self.mode {
                    form.error = Some(format::error_message(&err));
                }
            }
        }
    }

    async fn delete(&mut self, task_id: &str) {
        match self.board.gateway().remove(task_id).await {
            Ok(()) => {
                self.notice = Some(Notice::info("Task deleted"));
                self.reload().await;
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!(
                    "Failed to delete task: {}",
                    format::error_message(&err)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{task, FakeGateway};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    async fn app(tasks: Vec<Task>) -> App<FakeGateway> {
        let mut app = App::new(DragController::new(FakeGateway::with_tasks(tasks)), None);
        app.reload().await;
        app
    }

    async fn run(app: &mut App<FakeGateway>, code: KeyCode) {
        if let Some(command) = app.handle_key(key(code)) {
            app.execute(command).await;
        }
    }

    #[tokio::test]
    async fn keyboard_drag_moves_task_right_and_persists() {
        let mut app = app(vec![task("A", "pending"), task("B", "pending")]).await;
        run(&mut app, KeyCode::Char(' ')).await;
        assert!(app.board.is_dragging());
        run(&mut app, KeyCode::Right).await;
        assert_eq!(app.selected_bucket(), Bucket::InProgress);
        run(&mut app, KeyCode::Enter).await;

        assert!(!app.board.is_dragging());
        assert_eq!(
            app.board.gateway().updates(),
            [("A".to_string(), TaskPatch::status(Bucket::InProgress))]
        );
        assert_eq!(app.selected().map(|t| t.id.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn escape_cancels_keyboard_drag() {
        let mut app = app(vec![task("A", "pending")]).await;
        let before = app.board.tasks().clone();
        run(&mut app, KeyCode::Char(' ')).await;
        run(&mut app, KeyCode::Right).await;
        run(&mut app, KeyCode::Right).await;
        run(&mut app, KeyCode::Esc).await;
        assert_eq!(app.board.tasks(), &before);
        assert!(app.board.gateway().updates().is_empty());
    }

    #[tokio::test]
    async fn mouse_drag_between_columns() {
        let mut app = app(vec![task("A", "pending"), task("C", "completed")]).await;
        app.hit_map.add_card(Rect::new(1, 1, 10, 4), "A");
        app.hit_map.add_column(Rect::new(0, 0, 12, 20), Bucket::Pending);
        app.hit_map.add_column(Rect::new(12, 0, 12, 20), Bucket::InProgress);
        app.hit_map.add_column(Rect::new(24, 0, 12, 20), Bucket::Completed);

        assert!(app
            .handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2))
            .is_none());
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 30, 10));
        assert!(app.board.is_dragging());
        assert_eq!(app.board.tasks().locate("A").map(|l| l.0), Some(Bucket::Completed));

        let command = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 30, 10));
        assert_eq!(command, Some(Command::Drop(Some("completed".into()))));
        app.execute(command.unwrap()).await;
        assert_eq!(app.board.gateway().updates().len(), 1);
    }

    #[tokio::test]
    async fn release_outside_the_board_reverts() {
        let mut app = app(vec![task("A", "pending")]).await;
        let before = app.board.tasks().clone();
        app.hit_map.add_card(Rect::new(1, 1, 10, 4), "A");
        app.hit_map.add_column(Rect::new(0, 0, 12, 20), Bucket::Pending);
        app.hit_map.add_column(Rect::new(12, 0, 12, 20), Bucket::InProgress);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 14, 3));
        let command = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 80, 40));
        assert_eq!(command, Some(Command::Drop(None)));
        app.execute(command.unwrap()).await;

        assert_eq!(app.board.tasks(), &before);
        assert!(app.board.gateway().updates().is_empty());
    }

    #[tokio::test]
    async fn click_without_movement_does_not_drag() {
        let mut app = app(vec![task("A", "pending")]).await;
        app.hit_map.add_card(Rect::new(1, 1, 10, 4), "A");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 2, 2));
        assert!(!app.board.is_dragging());
        assert!(app
            .handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 2, 2))
            .is_none());
    }

    #[tokio::test]
    async fn overlong_title_is_rejected_in_the_form_without_a_request() {
        let mut app = app(vec![]).await;
        run(&mut app, KeyCode::Char('a')).await;
        for _ in 0..201 {
            app.handle_key(key(KeyCode::Char('x')));
        }
        run(&mut app, KeyCode::Enter).await;

        let Mode::Form(form) = &app.mode else {
            panic!("form should stay open");
        };
        assert!(form.error.as_deref().unwrap().contains("200"));
        assert!(app.board.gateway().tasks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_form_adds_task_in_selected_column() {
        let mut app = app(vec![]).await;
        run(&mut app, KeyCode::Right).await;
        run(&mut app, KeyCode::Char('a')).await;
        for c in "Ship it".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        run(&mut app, KeyCode::Enter).await;

        assert_eq!(app.mode, Mode::Normal);
        let created = app.board.tasks().bucket(Bucket::InProgress);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "Ship it");
    }

    #[tokio::test]
    async fn edit_form_can_change_status() {
        let mut app = app(vec![task("A", "pending")]).await;
        run(&mut app, KeyCode::Char('e')).await;
        run(&mut app, KeyCode::Tab).await;
        run(&mut app, KeyCode::Tab).await;
        run(&mut app, KeyCode::Right).await;
        run(&mut app, KeyCode::Enter).await;

        assert_eq!(app.board.tasks().locate("A").map(|l| l.0), Some(Bucket::InProgress));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let mut app = app(vec![task("A", "pending")]).await;
        run(&mut app, KeyCode::Char('d')).await;
        run(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.board.tasks().len(), 1);

        run(&mut app, KeyCode::Char('d')).await;
        run(&mut app, KeyCode::Char('y')).await;
        assert!(app.board.tasks().is_empty());
        assert_eq!(app.notice, Some(Notice::info("Task deleted")));
    }

    #[tokio::test]
    async fn notice_clears_on_next_board_key() {
        let mut app = app(vec![task("A", "pending")]).await;
        *app.board.gateway().fail_list.lock().unwrap() = Some(ApiError::Network("refused".into()));
        run(&mut app, KeyCode::Char('r')).await;
        assert!(app.notice.is_some());

        run(&mut app, KeyCode::Down).await;
        assert!(app.notice.is_none());
    }

    fn unverified() -> User {
        User {
            id: "u1".into(),
            email: "ann@example.com".into(),
            username: "ann".into(),
            full_name: "Ann Lee".into(),
            is_verified: false,
            is_active: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn resend_key_sends_verification_email() {
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/resend-verification"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "Verification email sent"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let api = crate::api::ApiClient::new(
            &format!("{}/api", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let mut app = App::new(DragController::new(FakeGateway::default()), Some(unverified()))
            .with_auth(AuthService::new(api));

        run(&mut app, KeyCode::Char('v')).await;

        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Info));
    }

    #[tokio::test]
    async fn resend_without_auth_reports_instead_of_ignoring() {
        let mut app = App::new(DragController::new(FakeGateway::default()), Some(unverified()));
        run(&mut app, KeyCode::Char('v')).await;
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
    }

    #[tokio::test]
    async fn failed_reload_surfaces_a_notice() {
        let mut app = app(vec![task("A", "pending")]).await;
        *app.board.gateway().fail_list.lock().unwrap() = Some(ApiError::Network("refused".into()));
        run(&mut app, KeyCode::Char('r')).await;
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
        assert_eq!(app.board.tasks().len(), 1);
    }
}
