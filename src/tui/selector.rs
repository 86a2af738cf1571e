use anyhow::Result;
use crossterm::{
    event::KeyEvent,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::models::DependencyFolder;
use crate::tui::events::{keys, Event, EventHandler};
use crate::utils::{size_format, time_format};

/// 按键处理后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorAction {
    /// 继续选择
    Continue,

    /// 确认当前选择
    Confirm,

    /// 放弃选择
    Cancel,
}

/// 多选列表的状态，不依赖终端
#[derive(Debug)]
pub struct Selector {
    /// 按大小降序排列的目录
    folders: Vec<DependencyFolder>,

    /// 每个目录是否被选中
    selected: Vec<bool>,

    /// 光标位置
    cursor: usize,
}

impl Selector {
    pub fn new(mut folders: Vec<DependencyFolder>) -> Self {
        folders.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        let selected = vec![false; folders.len()];
        Self {
            folders,
            selected,
            cursor: 0,
        }
    }

    pub fn folders(&self) -> &[DependencyFolder] {
        &self.folders
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.folders.len() {
            self.cursor += 1;
        }
    }

    /// 切换光标所在目录的选中状态
    pub fn toggle(&mut self) {
        if let Some(flag) = self.selected.get_mut(self.cursor) {
            *flag = !*flag;
        }
    }

    pub fn select_all(&mut self) {
        self.selected.iter_mut().for_each(|flag| *flag = true);
    }

    pub fn select_none(&mut self) {
        self.selected.iter_mut().for_each(|flag| *flag = false);
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|flag| **flag).count()
    }

    /// 选中目录的总大小
    pub fn selected_size(&self) -> u64 {
        self.folders
            .iter()
            .zip(&self.selected)
            .filter(|(_, flag)| **flag)
            .map(|(folder, _)| folder.size)
            .sum()
    }

    /// 处理一个按键
    pub fn handle_key(&mut self, key: &KeyEvent) -> SelectorAction {
        if keys::is_quit_key(key) {
            return SelectorAction::Cancel;
        }
        if keys::is_confirm_key(key) {
            return SelectorAction::Confirm;
        }

        if keys::is_up_key(key) {
            self.move_up();
        } else if keys::is_down_key(key) {
            self.move_down();
        } else if keys::is_toggle_key(key) {
            self.toggle();
        } else if keys::is_select_all_key(key) {
            self.select_all();
        } else if keys::is_select_none_key(key) {
            self.select_none();
        }

        SelectorAction::Continue
    }

    /// 取出选中的目录
    pub fn into_selection(self) -> Vec<DependencyFolder> {
        self.folders
            .into_iter()
            .zip(self.selected)
            .filter_map(|(folder, flag)| flag.then_some(folder))
            .collect()
    }

    /// 绘制界面
    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // 标题
                Constraint::Min(0),    // 列表
                Constraint::Length(3), // 帮助
            ])
            .split(f.area());

        self.draw_header(f, chunks[0]);
        self.draw_list(f, chunks[1]);
        self.draw_help(f, chunks[2]);
    }

    // 私有方法

    fn draw_header(&self, f: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("已选择 {} / {} 个目录", self.selected_count(), self.folders.len()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("可释放 {}", size_format::format_size(self.selected_size())),
                Style::default().fg(Color::Green),
            ),
        ]))
        .block(Block::default().title("依赖目录清理").borders(Borders::ALL));

        f.render_widget(header, area);
    }

    fn draw_list(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .folders
            .iter()
            .enumerate()
            .map(|(i, folder)| {
                let mark = if self.is_selected(i) { "[x]" } else { "[ ]" };
                let mark_style = if self.is_selected(i) {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Gray)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", mark), mark_style),
                    Span::styled(
                        format!("{:>10} ", size_format::format_size(folder.size)),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{:<8} ", folder.ecosystem.label()),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("{:<12} ", time_format::format_relative_time(folder.access_time)),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::raw(folder.path.display().to_string()),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.cursor));

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));

        f.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_help(&self, f: &mut Frame, area: Rect) {
        let help = Paragraph::new("↑/↓ 移动  空格 选择  a 全选  n 全不选  Enter 确认  q 取消")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(help, area);
    }
}

/// 离开作用域时恢复终端
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// 在全屏列表中选择要清理的目录，取消时返回空列表
pub async fn run_selector(folders: Vec<DependencyFolder>) -> Result<Vec<DependencyFolder>> {
    if folders.is_empty() {
        return Ok(Vec::new());
    }

    let mut selector = Selector::new(folders);

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.hide_cursor()?;

    let mut events = EventHandler::start();

    let action = loop {
        terminal.draw(|f| selector.draw(f))?;

        match events.next().await? {
            Event::Key(key) => match selector.handle_key(&key) {
                SelectorAction::Continue => {}
                action => break action,
            },
            Event::Resize(_, _) => {
                // 下一轮重绘时自动适配
            }
        }
    };

    terminal.show_cursor()?;

    match action {
        SelectorAction::Confirm => Ok(selector.into_selection()),
        _ => Ok(Vec::new()),
    }
}
