use anyhow::Result;
use crossterm::event::{self, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 终端事件
#[derive(Clone, Debug)]
pub enum Event {
    /// 键盘输入事件
    Key(KeyEvent),

    /// 终端大小调整事件
    Resize(u16, u16),
}

/// 事件处理器 - 在阻塞线程中读取终端事件并转发
pub struct EventHandler {
    /// 事件接收器
    receiver: mpsc::UnboundedReceiver<Event>,

    /// 通知读取线程退出
    stop: CancellationToken,
}

impl EventHandler {
    /// 创建并启动事件监听
    pub fn start() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let reader_stop = stop.clone();

        tokio::task::spawn_blocking(move || {
            while !reader_stop.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        tracing::debug!(error = %err, "读取终端事件失败");
                        break;
                    }
                }

                let app_event = match event::read() {
                    // Windows 上同一次按键会产生按下和释放两个事件
                    Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                    Ok(event::Event::Resize(w, h)) => Event::Resize(w, h),
                    Ok(_) => continue,
                    Err(_) => break,
                };

                if sender.send(app_event).is_err() {
                    break;
                }
            }
        });

        Self { receiver, stop }
    }

    /// 接收下一个事件
    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("事件通道已关闭"))
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// 键盘快捷键辅助函数
pub mod keys {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    /// 检查是否是退出键 (Ctrl+C, ESC, q)
    pub fn is_quit_key(key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
            KeyCode::Esc => true,
            KeyCode::Char('q') | KeyCode::Char('Q') => true,
            _ => false,
        }
    }

    /// 检查是否是向上导航键
    pub fn is_up_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    }

    /// 检查是否是向下导航键
    pub fn is_down_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    }

    /// 检查是否是切换选中键 (Space)
    pub fn is_toggle_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char(' '))
    }

    /// 检查是否是全选键 (a)
    pub fn is_select_all_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('a') | KeyCode::Char('A'))
            && !key.modifiers.contains(KeyModifiers::CONTROL)
    }

    /// 检查是否是全不选键 (n)
    pub fn is_select_none_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N'))
    }

    /// 检查是否是确认键 (Enter)
    pub fn is_confirm_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Enter)
    }
}
