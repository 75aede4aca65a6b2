//! Interactive terminal menu.
//!
//! The menu is the foreground half of the process: a blocking loop over
//! stdin offering add, view, delete, and exit. It shares the [`TaskStore`]
//! with the deadline monitor, so every view is a snapshot and every deletion
//! is keyed by the task identifier captured when the list was rendered: the
//! list may shrink underneath the user while they navigate.
//!
//! Line-driven flows (menu choice, task text, deadline, confirmation) read
//! from any `BufRead` and write to any `Write`, which keeps them testable
//! without a terminal. Only the delete selector switches the terminal into
//! raw mode, restored on every exit path by an RAII guard.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind},
    queue,
    style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::store::{StoreError, TaskStore};
use crate::task::{parse_deadline, Task, DEADLINE_FORMAT_HINT};

/// Sentinel input that cancels the add flow.
const CANCEL_SENTINEL: &str = "exit";

/// Outcome of one pass through the main menu.
#[derive(Debug, PartialEq, Eq)]
enum MenuAction {
    Continue,
    Exit,
}

/// The interactive menu controller.
pub struct Menu {
    /// Shared task collection.
    store: Arc<TaskStore>,
}

impl Menu {
    /// Creates a menu over the shared store.
    #[must_use]
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Runs the menu loop on stdin/stdout until the user exits.
    ///
    /// # Errors
    ///
    /// Propagates terminal I/O failures; user-level problems (bad input,
    /// vanished tasks, failed saves) are reported inline and never abort
    /// the loop.
    pub fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout();
        self.run_with(&mut input, &mut out)
    }

    /// Menu loop over explicit input/output handles.
    fn run_with(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        loop {
            writeln!(out)?;
            writeln!(out, "Main menu:")?;
            writeln!(out, "  1. Add a task")?;
            writeln!(out, "  2. View tasks")?;
            writeln!(out, "  3. Delete a task")?;
            writeln!(out, "  4. Exit")?;
            write!(out, "> ")?;
            out.flush()?;

            let choice = match read_line(input)? {
                Some(line) => line,
                // EOF on stdin counts as exit.
                None => return Ok(()),
            };

            let action = match choice.as_str() {
                "1" => self.add_flow(input, out)?,
                "2" => self.view_flow(input, out)?,
                "3" => self.delete_flow(input, out)?,
                "4" => MenuAction::Exit,
                "" => MenuAction::Continue,
                other => {
                    writeln!(out, "Unknown option {other:?}, choose 1-4.")?;
                    MenuAction::Continue
                }
            };

            if action == MenuAction::Exit {
                return Ok(());
            }
        }
    }

    /// Prompts for text and deadline, then adds the task.
    fn add_flow(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<MenuAction> {
        writeln!(out, "Enter the task (or '{CANCEL_SENTINEL}' to return to the menu):")?;
        let text = match read_line(input)? {
            Some(line) => line,
            None => return Ok(MenuAction::Exit),
        };
        if text.is_empty() {
            writeln!(out, "Task text cannot be empty.")?;
            return Ok(MenuAction::Continue);
        }
        if text.eq_ignore_ascii_case(CANCEL_SENTINEL) {
            return Ok(MenuAction::Continue);
        }

        writeln!(out, "Enter the deadline ({DEADLINE_FORMAT_HINT}):")?;
        let raw_deadline = match read_line(input)? {
            Some(line) => line,
            None => return Ok(MenuAction::Exit),
        };
        let deadline = match parse_deadline(&raw_deadline) {
            Ok(deadline) => deadline,
            Err(e) => {
                writeln!(out, "{e}. Try again from the menu.")?;
                return Ok(MenuAction::Continue);
            }
        };

        let task = Task::new(text, deadline);
        debug!(id = %task.id, "Menu adding task");
        match self.store.add(task) {
            Ok(()) => writeln!(out, "Task added.")?,
            Err(e @ StoreError::Persistence(_)) => {
                writeln!(out, "Warning: {e}")?;
            }
            Err(e) => writeln!(out, "{e}")?,
        }
        Ok(MenuAction::Continue)
    }

    /// Renders a snapshot of the current tasks.
    fn view_flow(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<MenuAction> {
        let tasks = self.store.tasks();
        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
        } else {
            writeln!(out, "Tasks:")?;
            for task in &tasks {
                writeln!(out, "  {task}")?;
            }
        }
        pause(input, out)?;
        Ok(MenuAction::Continue)
    }

    /// Arrow-key selection, confirmation, and identifier-keyed removal.
    fn delete_flow(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<MenuAction> {
        let tasks = self.store.tasks();
        if tasks.is_empty() {
            writeln!(out, "No tasks to delete.")?;
            pause(input, out)?;
            return Ok(MenuAction::Continue);
        }

        let selected = select_task(&tasks)?;
        let Some(id) = selected else {
            writeln!(out, "Deletion cancelled.")?;
            return Ok(MenuAction::Continue);
        };

        // The selection is a stable identifier, not an index: the monitor
        // may have mutated the store while the user navigated.
        let text = tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.confirm_and_remove(id, &text, input, out)?;
        Ok(MenuAction::Continue)
    }

    /// Asks for confirmation and removes the task by identifier.
    fn confirm_and_remove(
        &self,
        id: Uuid,
        text: &str,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        writeln!(out, "Delete task '{text}'? (y/n)")?;
        let answer = read_line(input)?.unwrap_or_default();
        if !answer.eq_ignore_ascii_case("y") {
            writeln!(out, "Deletion cancelled.")?;
            return Ok(());
        }

        match self.store.remove(id) {
            Ok(removed) => writeln!(out, "Deleted '{}'.", removed.text)?,
            Err(StoreError::NotFound { .. }) => {
                writeln!(
                    out,
                    "That task no longer exists (its deadline may have passed). Please retry."
                )?;
            }
            Err(e @ StoreError::Persistence(_)) => {
                writeln!(out, "Task deleted, but: {e}")?;
            }
        }
        Ok(())
    }
}

/// Reads one trimmed line; `None` on EOF.
fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// "Press Enter to continue" gate between screens.
fn pause(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
    write!(out, "Press Enter to return to the menu...")?;
    out.flush()?;
    let _ = read_line(input)?;
    Ok(())
}

/// Restores cooked terminal mode on drop, whatever the exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort: the terminal may already be in a bad state, and a
        // panic during unwinding would abort.
        let _ = disable_raw_mode();
    }
}

/// Full-screen arrow-key selector over a task snapshot.
///
/// Up/Down move with wrap-around, Enter chooses, Escape cancels. Returns
/// the identifier of the chosen task, captured from the snapshot at render
/// time.
fn select_task(tasks: &[Task]) -> io::Result<Option<Uuid>> {
    let _guard = RawModeGuard::new()?;
    let mut stdout = io::stdout();
    let mut selected = 0usize;

    loop {
        queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        write!(
            stdout,
            "Select a task to delete (Up/Down to move, Enter to choose, Esc to cancel):\r\n"
        )?;
        for (i, task) in tasks.iter().enumerate() {
            if i == selected {
                queue!(
                    stdout,
                    SetBackgroundColor(Color::Grey),
                    SetForegroundColor(Color::Black)
                )?;
            }
            write!(stdout, "{task}")?;
            queue!(stdout, ResetColor)?;
            write!(stdout, "\r\n")?;
        }
        stdout.flush()?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Up => selected = step_selection(selected, tasks.len(), -1),
                KeyCode::Down => selected = step_selection(selected, tasks.len(), 1),
                KeyCode::Enter => {
                    write!(stdout, "\r\n")?;
                    return Ok(Some(tasks[selected].id));
                }
                KeyCode::Esc => {
                    write!(stdout, "\r\n")?;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

/// Moves the highlighted index by one step with wrap-around.
fn step_selection(current: usize, len: usize, delta: isize) -> usize {
    debug_assert!(len > 0);
    if delta < 0 {
        if current == 0 {
            len - 1
        } else {
            current - 1
        }
    } else if current + 1 >= len {
        0
    } else {
        current + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use chrono::{Duration, Local};
    use tempfile::tempdir;

    use crate::storage::Storage;

    fn menu_fixture(dir: &tempfile::TempDir) -> (Arc<TaskStore>, Menu) {
        let store = Arc::new(
            TaskStore::open(Storage::new(dir.path().join("tasks.json"))).unwrap(),
        );
        let menu = Menu::new(Arc::clone(&store));
        (store, menu)
    }

    fn run_script(menu: &Menu, script: &str) -> String {
        let mut input = Cursor::new(script.to_string());
        let mut out = Vec::new();
        menu.run_with(&mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn exit_option_ends_the_loop() {
        let dir = tempdir().unwrap();
        let (_store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "4\n");
        assert!(out.contains("Main menu:"));
    }

    #[test]
    fn eof_ends_the_loop() {
        let dir = tempdir().unwrap();
        let (_store, menu) = menu_fixture(&dir);

        run_script(&menu, "");
    }

    #[test]
    fn add_flow_creates_task() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "1\nBuy milk\n2030-01-01 09:00\n4\n");
        assert!(out.contains("Task added."));

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Buy milk");
    }

    #[test]
    fn add_flow_rejects_empty_text() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "1\n\n4\n");
        assert!(out.contains("Task text cannot be empty."));
        assert!(store.is_empty());
    }

    #[test]
    fn add_flow_exit_sentinel_cancels() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);

        run_script(&menu, "1\nexit\n4\n");
        assert!(store.is_empty());
    }

    #[test]
    fn add_flow_reports_bad_deadline_and_returns_to_menu() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "1\nBuy milk\nnext tuesday\n4\n");
        assert!(out.contains("invalid deadline"));
        assert!(store.is_empty());
        // The loop survived: the exit option was still processed.
        assert!(out.matches("Main menu:").count() >= 2);
    }

    #[test]
    fn view_flow_lists_snapshot() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);
        store
            .add(Task::new(
                "Water plants".to_string(),
                Local::now() + Duration::hours(1),
            ))
            .unwrap();

        let out = run_script(&menu, "2\n\n4\n");
        assert!(out.contains("Water plants"));
    }

    #[test]
    fn view_flow_empty_store() {
        let dir = tempdir().unwrap();
        let (_store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "2\n\n4\n");
        assert!(out.contains("No tasks."));
    }

    #[test]
    fn delete_flow_with_empty_store_reports_and_returns() {
        let dir = tempdir().unwrap();
        let (_store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "3\n\n4\n");
        assert!(out.contains("No tasks to delete."));
    }

    #[test]
    fn unknown_option_is_reported() {
        let dir = tempdir().unwrap();
        let (_store, menu) = menu_fixture(&dir);

        let out = run_script(&menu, "9\n4\n");
        assert!(out.contains("Unknown option"));
    }

    #[test]
    fn confirm_and_remove_deletes_on_yes() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);
        let task = Task::new("Doomed".to_string(), Local::now() + Duration::hours(1));
        store.add(task.clone()).unwrap();

        let mut input = Cursor::new("y\n".to_string());
        let mut out = Vec::new();
        menu.confirm_and_remove(task.id, &task.text, &mut input, &mut out)
            .unwrap();

        assert!(store.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Deleted 'Doomed'."));
    }

    #[test]
    fn confirm_and_remove_keeps_task_on_no() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);
        let task = Task::new("Spared".to_string(), Local::now() + Duration::hours(1));
        store.add(task.clone()).unwrap();

        let mut input = Cursor::new("n\n".to_string());
        let mut out = Vec::new();
        menu.confirm_and_remove(task.id, &task.text, &mut input, &mut out)
            .unwrap();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn confirm_and_remove_reports_vanished_task() {
        let dir = tempdir().unwrap();
        let (store, menu) = menu_fixture(&dir);
        let task = Task::new("Gone".to_string(), Local::now() + Duration::hours(1));
        store.add(task.clone()).unwrap();

        // Simulate the monitor removing it between render and confirm.
        store.remove(task.id).unwrap();

        let mut input = Cursor::new("y\n".to_string());
        let mut out = Vec::new();
        menu.confirm_and_remove(task.id, &task.text, &mut input, &mut out)
            .unwrap();

        assert!(String::from_utf8(out)
            .unwrap()
            .contains("no longer exists"));
    }

    #[test]
    fn step_selection_wraps_both_ways() {
        assert_eq!(step_selection(0, 3, -1), 2);
        assert_eq!(step_selection(2, 3, 1), 0);
        assert_eq!(step_selection(1, 3, 1), 2);
        assert_eq!(step_selection(1, 3, -1), 0);
        assert_eq!(step_selection(0, 1, 1), 0);
        assert_eq!(step_selection(0, 1, -1), 0);
    }
}
