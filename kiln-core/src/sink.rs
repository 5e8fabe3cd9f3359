//! 诊断输出
//!
//! 方法体中的 `println` 写到 [`DiagnosticSink`]，与日志无关。调用桥不缓冲也不
//! 吞掉这些输出。

use std::cell::RefCell;
use std::rc::Rc;

/// 方法体输出的目标
pub trait DiagnosticSink {
    fn print_line(&self, line: &str);
}

/// 写到标准输出
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn print_line(&self, line: &str) {
        println!("{}", line);
    }
}

/// 记录所有输出行；克隆共享同一缓冲
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的行
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// 取出并清空
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

impl DiagnosticSink for CaptureSink {
    fn print_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_shares_buffer() {
        let sink = CaptureSink::new();
        let clone = sink.clone();

        clone.print_line("24 sample");
        sink.print_line("second");

        assert_eq!(sink.lines(), vec!["24 sample", "second"]);
        assert_eq!(clone.take().len(), 2);
        assert!(sink.lines().is_empty());
    }
}
