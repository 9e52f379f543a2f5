//! 前端控制句柄
//!
//! 回调运行在帧循环内部，不能直接借用前端；它们通过句柄提交请求，
//! 前端在下一次循环迭代开始时统一处理。

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Requests {
    shutdown: Cell<bool>,
    pause: Cell<bool>,
    resume: Cell<bool>,
}

/// 本次迭代需要处理的请求
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PendingRequests {
    pub shutdown: bool,
    pub pause: bool,
    pub resume: bool,
}

/// 可克隆的前端控制句柄
#[derive(Debug, Clone, Default)]
pub struct FrontendHandle {
    requests: Rc<Requests>,
}

impl FrontendHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求结束帧循环
    pub fn request_shutdown(&self) {
        self.requests.shutdown.set(true);
    }

    /// 请求暂停（仅在运行状态下生效）
    pub fn request_pause(&self) {
        self.requests.pause.set(true);
    }

    /// 请求恢复（仅在暂停状态下生效）
    pub fn request_resume(&self) {
        self.requests.resume.set(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requests.shutdown.get()
    }

    /// 取出并清空暂停/恢复请求；关闭请求保持到 [`clear`](Self::clear)
    pub(crate) fn take(&self) -> PendingRequests {
        PendingRequests {
            shutdown: self.requests.shutdown.get(),
            pause: self.requests.pause.take(),
            resume: self.requests.resume.take(),
        }
    }

    pub(crate) fn clear(&self) {
        self.requests.shutdown.set(false);
        self.requests.pause.set(false);
        self.requests.resume.set(false);
    }
}
