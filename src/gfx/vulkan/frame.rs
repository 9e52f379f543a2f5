//! 帧同步
//!
//! N 个帧槽位轮转使用，每个槽位有一个命令缓冲、一对信号量
//! （图像可用 / 渲染完成）和一个完成栅栏。
//! `begin_frame` 等待当前槽位的栅栏后才复用它的资源，
//! 因此任意时刻最多只有 N 帧的 GPU 工作未完成。
//!
//! 槽位在后端初始化时创建，交换链重建时不受影响。

use ash::vk;
use tracing::debug;

use super::api::VulkanApi;
use crate::core::error::{BackendError, BackendResult};

/// 帧槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameIndex(usize);

impl FrameIndex {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// 一个帧槽位的全部句柄
#[derive(Debug, Clone, Copy)]
pub struct FrameSlot {
    pub command_buffer: vk::CommandBuffer,
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub in_flight: vk::Fence,
}

#[derive(Debug, Clone, Copy)]
struct SlotSync {
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    in_flight: vk::Fence,
    /// 栅栏已重置但本槽位的工作尚未提交，此时等待栅栏会永远阻塞
    fence_reset_unsubmitted: bool,
}

/// 帧槽位管理
#[derive(Debug)]
pub struct FrameSynchronizer {
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    sync: Vec<SlotSync>,
    current: usize,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self {
            command_pool: vk::CommandPool::null(),
            command_buffers: Vec::new(),
            sync: Vec::new(),
            current: 0,
        }
    }
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建命令池、每帧命令缓冲，然后创建同步对象
    ///
    /// 失败时已创建的对象保留在结构中，由 [`destroy`](Self::destroy) 统一释放。
    pub fn create<A: VulkanApi>(&mut self, api: &mut A, queue_family: u32, frames: u32) -> BackendResult {
        self.command_pool = api
            .create_command_pool(queue_family)
            .map_err(|r| BackendError::from_vk(r, BackendError::FailedCommandBufferCreation))?;

        self.command_buffers = api
            .allocate_command_buffers(self.command_pool, frames)
            .map_err(|r| BackendError::from_vk(r, BackendError::FailedCommandBufferCreation))?;

        for _ in 0..frames {
            let slot = Self::create_slot_sync(api)?;
            self.sync.push(slot);
        }

        self.current = 0;
        debug!(frames, "Frame synchronization objects created");
        Ok(())
    }

    fn create_slot_sync<A: VulkanApi>(api: &mut A) -> BackendResult<SlotSync> {
        let sync_error = |r| BackendError::from_vk(r, BackendError::FailedSyncCreation);

        let image_available = api.create_semaphore().map_err(sync_error)?;
        let render_finished = match api.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(r) => {
                api.destroy_semaphore(image_available);
                return Err(sync_error(r));
            }
        };
        // 初始为已触发状态，第一次 begin_frame 不会阻塞
        let in_flight = match api.create_fence(true) {
            Ok(fence) => fence,
            Err(r) => {
                api.destroy_semaphore(render_finished);
                api.destroy_semaphore(image_available);
                return Err(sync_error(r));
            }
        };

        Ok(SlotSync {
            image_available,
            render_finished,
            in_flight,
            fence_reset_unsubmitted: false,
        })
    }

    /// 先销毁同步对象，再销毁命令池（连同命令缓冲）
    pub fn destroy<A: VulkanApi>(&mut self, api: &mut A) {
        let had_objects = !self.sync.is_empty() || self.command_pool != vk::CommandPool::null();

        for slot in self.sync.drain(..) {
            api.destroy_fence(slot.in_flight);
            api.destroy_semaphore(slot.render_finished);
            api.destroy_semaphore(slot.image_available);
        }
        if self.command_pool != vk::CommandPool::null() {
            api.destroy_command_pool(self.command_pool);
            self.command_pool = vk::CommandPool::null();
        }
        self.command_buffers.clear();
        self.current = 0;

        if had_objects {
            debug!("Frame synchronization objects destroyed");
        }
    }

    /// 替换当前槽位的两个信号量
    ///
    /// 一帧获取了图像却没有提交时，它的图像可用信号量处于已触发状态，不能再用于获取。
    /// 调用前设备必须空闲。
    pub fn replace_current_semaphores<A: VulkanApi>(&mut self, api: &mut A) -> BackendResult {
        let sync_error = |r| BackendError::from_vk(r, BackendError::FailedSyncCreation);
        let image_available = api.create_semaphore().map_err(sync_error)?;
        let render_finished = match api.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(r) => {
                api.destroy_semaphore(image_available);
                return Err(sync_error(r));
            }
        };

        let slot = self
            .sync
            .get_mut(self.current)
            .ok_or(BackendError::FailedInitialization)?;
        api.destroy_semaphore(std::mem::replace(&mut slot.image_available, image_available));
        api.destroy_semaphore(std::mem::replace(&mut slot.render_finished, render_finished));
        Ok(())
    }

    pub fn frames_in_flight(&self) -> usize {
        self.sync.len()
    }

    pub fn current(&self) -> FrameIndex {
        FrameIndex(self.current)
    }

    pub fn slot(&self, index: FrameIndex) -> Option<FrameSlot> {
        let sync = self.sync.get(index.0)?;
        let command_buffer = *self.command_buffers.get(index.0)?;
        Some(FrameSlot {
            command_buffer,
            image_available: sync.image_available,
            render_finished: sync.render_finished,
            in_flight: sync.in_flight,
        })
    }

    pub fn current_slot(&self) -> BackendResult<FrameSlot> {
        self.slot(self.current()).ok_or(BackendError::FailedInitialization)
    }

    /// 当前槽位的栅栏是否需要等待
    pub fn needs_fence_wait(&self) -> bool {
        self.sync
            .get(self.current)
            .map_or(false, |slot| !slot.fence_reset_unsubmitted)
    }

    /// 当前槽位的栅栏已重置，等待提交
    pub fn mark_fence_reset(&mut self) {
        if let Some(slot) = self.sync.get_mut(self.current) {
            slot.fence_reset_unsubmitted = true;
        }
    }

    /// 当前槽位的工作已提交，栅栏会在完成时触发
    pub fn mark_submitted(&mut self) {
        if let Some(slot) = self.sync.get_mut(self.current) {
            slot.fence_reset_unsubmitted = false;
        }
    }

    /// 轮转到下一个槽位
    pub fn advance(&mut self) {
        if !self.sync.is_empty() {
            self.current = (self.current + 1) % self.sync.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::vulkan::mock::{MockStep, MockVulkan};

    #[test]
    fn test_slot_rotation() {
        let (mut api, _state) = MockVulkan::with_devices(vec![]);
        let mut frames = FrameSynchronizer::new();
        frames.create(&mut api, 0, 3).unwrap();

        assert_eq!(frames.frames_in_flight(), 3);
        let visited: Vec<usize> = (0..7)
            .map(|_| {
                let index = frames.current().as_usize();
                frames.advance();
                index
            })
            .collect();
        assert_eq!(visited, vec![0, 1, 2, 0, 1, 2, 0]);

        frames.destroy(&mut api);
    }

    #[test]
    fn test_fences_start_signaled_and_wait_tracking() {
        let (mut api, state) = MockVulkan::with_devices(vec![]);
        let mut frames = FrameSynchronizer::new();
        frames.create(&mut api, 0, 2).unwrap();

        let slot = frames.current_slot().unwrap();
        assert!(frames.needs_fence_wait());
        api.wait_for_fence(slot.in_flight, 0).unwrap();

        frames.mark_fence_reset();
        assert!(!frames.needs_fence_wait());
        frames.mark_submitted();
        assert!(frames.needs_fence_wait());

        frames.destroy(&mut api);
        assert_eq!(state.borrow().live_handle_count(), 0);
    }

    #[test]
    fn test_partial_creation_is_released() {
        let (mut api, state) = MockVulkan::with_devices(vec![]);
        state.borrow_mut().fail_at = Some(MockStep::Fence);

        let mut frames = FrameSynchronizer::new();
        assert_eq!(frames.create(&mut api, 0, 2), Err(BackendError::FailedSyncCreation));

        frames.destroy(&mut api);
        frames.destroy(&mut api);
        assert_eq!(state.borrow().live_handle_count(), 0);
        assert_eq!(state.borrow().double_frees, 0);
    }

    #[test]
    fn test_replace_semaphores_keeps_fence() {
        let (mut api, state) = MockVulkan::with_devices(vec![]);
        let mut frames = FrameSynchronizer::new();
        frames.create(&mut api, 0, 2).unwrap();

        let before = frames.current_slot().unwrap();
        frames.replace_current_semaphores(&mut api).unwrap();
        let after = frames.current_slot().unwrap();

        assert_ne!(before.image_available, after.image_available);
        assert_ne!(before.render_finished, after.render_finished);
        assert_eq!(before.in_flight, after.in_flight);

        frames.destroy(&mut api);
        assert_eq!(state.borrow().live_handle_count(), 0);
    }
}
