// Wayland shared memory buffer pool for the bar surface

use smithay_client_toolkit::shm::{
    slot::{Buffer, SlotPool},
    Shm,
};
use tracing::debug;

use crate::error::{BarError, Result};

/// Double-buffered wl_shm pool at the bar's fixed dimensions
pub struct BufferPool {
    pool: SlotPool,
    width: u32,
    height: u32,
}

impl BufferPool {
    pub fn new(width: u32, height: u32, shm: &Shm) -> Result<Self> {
        let pool_size = (width * height * 4) as usize * 2;
        let pool = SlotPool::new(pool_size, shm).map_err(|e| {
            BarError::BufferCreation(format!("failed to create slot pool: {}", e))
        })?;

        debug!(
            width = %width,
            height = %height,
            pool_size_bytes = %pool_size,
            "Created buffer pool"
        );

        Ok(Self {
            pool,
            width,
            height,
        })
    }

    /// Get a buffer and its canvas bytes for one frame. The renderer
    /// overwrites the whole canvas, so no clearing happens here.
    pub fn get_buffer(&mut self) -> Result<(Buffer, &mut [u8])> {
        let stride = self.width as i32 * 4;
        self.pool
            .create_buffer(
                self.width as i32,
                self.height as i32,
                stride,
                wayland_client::protocol::wl_shm::Format::Argb8888,
            )
            .map_err(|e| BarError::BufferCreation(format!("failed to create buffer: {}", e)))
    }
}
