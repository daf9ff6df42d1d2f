//! 当前块与其所在 tile 的只读上下文.

use av1mv_core::{BlockSize, ReferenceFrameType};

use crate::block_grid::{BlockGrid, BlockParameters};
use crate::frame_header::{FrameHeader, TileBounds};
use crate::motion_field::TemporalMotionField;

/// tile 级只读状态, 显式传给各扫描器
#[derive(Debug, Clone, Copy)]
pub struct TileContext<'a> {
    pub header: &'a FrameHeader,
    pub bounds: TileBounds,
    pub grid: &'a BlockGrid,
    /// 当前帧的时域运动场, `use_ref_frame_mvs` 关闭时为 `None`
    pub motion_field: Option<&'a TemporalMotionField>,
}

impl<'a> TileContext<'a> {
    /// 覆盖整帧的 tile
    pub fn new(header: &'a FrameHeader, grid: &'a BlockGrid) -> Self {
        Self {
            header,
            bounds: TileBounds::whole_frame(header),
            grid,
            motion_field: None,
        }
    }

    pub fn with_bounds(mut self, bounds: TileBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_motion_field(mut self, motion_field: &'a TemporalMotionField) -> Self {
        self.motion_field = Some(motion_field);
        self
    }

    /// tile 内某位置已解码块的参数
    pub fn parameters(&self, row4x4: i32, column4x4: i32) -> Option<&'a BlockParameters> {
        if !self.bounds.is_inside(row4x4, column4x4) {
            return None;
        }
        self.grid.get(row4x4, column4x4)
    }
}

/// 正在预测的块
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub tile: TileContext<'a>,
    pub row4x4: i32,
    pub column4x4: i32,
    pub size: BlockSize,
    pub width4x4: i32,
    pub height4x4: i32,
    /// 当前块自身的参数 (参考帧, 已知的运动向量)
    pub params: &'a BlockParameters,
}

impl<'a> Block<'a> {
    pub fn new(
        tile: TileContext<'a>,
        row4x4: i32,
        column4x4: i32,
        params: &'a BlockParameters,
    ) -> Self {
        let size = params.size;
        Self {
            tile,
            row4x4,
            column4x4,
            size,
            width4x4: size.width4x4() as i32,
            height4x4: size.height4x4() as i32,
            params,
        }
    }

    pub fn header(&self) -> &'a FrameHeader {
        self.tile.header
    }

    pub fn reference_frame(&self, index: usize) -> ReferenceFrameType {
        self.params.reference_frame[index]
    }

    pub fn is_compound(&self) -> bool {
        self.params.is_compound()
    }

    /// 宽 (像素)
    pub fn width(&self) -> i32 {
        self.size.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.size.height() as i32
    }

    /// 上方一行是否在 tile 内
    pub fn top_available(&self) -> bool {
        self.tile.bounds.is_top_inside(self.row4x4)
    }

    /// 左侧一列是否在 tile 内
    pub fn left_available(&self) -> bool {
        self.tile.bounds.is_left_inside(self.column4x4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use av1mv_core::PredictionMode;

    #[test]
    fn test_availability_follows_tile_bounds() {
        let header = FrameHeader::new(32, 32).unwrap();
        let grid = BlockGrid::new(32, 32).unwrap();
        let params = BlockParameters::intra(BlockSize::Block16x8, PredictionMode::Dc);
        let tile = TileContext::new(&header, &grid).with_bounds(TileBounds::new(16, 32, 0, 32));

        let block = Block::new(tile, 16, 4, &params);
        assert!(!block.top_available());
        assert!(block.left_available());
        assert_eq!((block.width4x4, block.height4x4), (4, 2));
        assert_eq!(block.width(), 16);

        let block = Block::new(tile, 18, 0, &params);
        assert!(block.top_available());
        assert!(!block.left_available());
    }

    #[test]
    fn test_parameters_respect_tile() {
        let header = FrameHeader::new(16, 16).unwrap();
        let mut grid = BlockGrid::new(16, 16).unwrap();
        grid.insert(0, 0, BlockParameters::intra(BlockSize::Block32x32, PredictionMode::Dc))
            .unwrap();
        let tile = TileContext::new(&header, &grid);
        assert!(tile.parameters(7, 7).is_some());
        assert!(tile.parameters(8, 0).is_none());
        let tile = tile.with_bounds(TileBounds::new(0, 16, 4, 16));
        assert!(tile.parameters(0, 0).is_none());
    }
}
