//! Mock 事件源
//!
//! 用于无 Redis 环境的测试。按脚本依次返回行、EOF 或错误，
//! 脚本耗尽后每次读取都返回 EOF。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, LineSource, SourceRead};

/// 脚本中的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockStep {
    /// 返回一行
    Line(String),
    /// 返回 EOF (会话结束)
    Eof,
    /// 返回读取错误
    Error(String),
}

/// Mock 事件源
pub struct MockLineSource {
    name: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

/// 向运行中的 [`MockLineSource`] 追加脚本的句柄
#[derive(Clone)]
pub struct MockHandle {
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockLineSource {
    /// 创建空脚本的 Mock 源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// 创建按顺序返回给定行的 Mock 源
    pub fn with_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new(name);
        source.handle().push_lines(lines);
        source
    }

    /// 获取脚本句柄
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            script: self.script.clone(),
        }
    }
}

impl MockHandle {
    /// 追加一行
    pub fn push_line(&self, line: impl Into<String>) {
        self.lock().push_back(MockStep::Line(line.into()));
    }

    /// 追加多行
    pub fn push_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .extend(lines.into_iter().map(|l| MockStep::Line(l.into())));
    }

    /// 追加 EOF
    pub fn push_eof(&self) {
        self.lock().push_back(MockStep::Eof);
    }

    /// 追加读取错误
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().push_back(MockStep::Error(message.into()));
    }

    /// 尚未消费的步骤数
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<MockStep>> {
        lock_script(&self.script)
    }
}

fn lock_script(script: &Mutex<VecDeque<MockStep>>) -> MutexGuard<'_, VecDeque<MockStep>> {
    script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LineSource for MockLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_line(&mut self) -> SourceRead {
        match lock_script(&self.script).pop_front() {
            Some(MockStep::Line(line)) => Ok(Some(line)),
            Some(MockStep::Error(message)) => Err(ContractError::source_read(&self.name, message)),
            Some(MockStep::Eof) | None => Ok(None),
        }
    }
}
