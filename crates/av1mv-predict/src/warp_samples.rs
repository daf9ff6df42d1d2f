//! 局部 warp 模型的最小二乘样本收集.

use av1mv_core::BlockSize;
use av1mv_core::block_size::NUM_BLOCK_SIZES;
use av1mv_core::ReferenceFrameType;

use crate::block::Block;

/// 最小二乘拟合最多使用的样本数
pub const MAX_LEAST_SQUARES_SAMPLES: usize = 8;

/// 样本有效的运动向量偏差阈值: `clip3(16, 112, max(宽, 高))`
pub const WARP_VALID_THRESHOLD: [i32; NUM_BLOCK_SIZES] = [
    16, 16, 16, 16, 16, 16, 32, 16, 16, 16, 32, 64, 32, 32, 32, 64, 64, 64, 64, 112, 112, 112,
];

/// 收集到的样本
///
/// 每个样本为 `[mid_y, mid_x, mid_y + mv_row, mid_x + mv_column]`, 坐标放大 8 倍.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarpSamples {
    pub candidates: [[i32; 4]; MAX_LEAST_SQUARES_SAMPLES],
    /// 有效样本数
    pub num_warp_samples: usize,
    /// 扫描过的样本数 (含无效样本)
    pub num_samples_scanned: usize,
}

impl WarpSamples {
    /// 参与拟合的样本
    pub fn samples(&self) -> &[[i32; 4]] {
        &self.candidates[..self.num_warp_samples]
    }

    fn add(&mut self, block: &Block<'_>, delta_row: i32, delta_column: i32) {
        if self.num_samples_scanned >= MAX_LEAST_SQUARES_SAMPLES {
            return;
        }
        let tile = &block.tile;
        let mv_row = block.row4x4 + delta_row;
        let mv_column = block.column4x4 + delta_column;
        let Some(neighbor) = tile.parameters(mv_row, mv_column) else {
            return;
        };
        if neighbor.reference_frame[0] != block.reference_frame(0)
            || neighbor.reference_frame[1] != ReferenceFrameType::None
        {
            return;
        }
        self.num_samples_scanned += 1;

        let height4x4 = neighbor.size.height4x4() as i32;
        let width4x4 = neighbor.size.width4x4() as i32;
        let candidate_row = mv_row & !(height4x4 - 1);
        let candidate_column = mv_column & !(width4x4 - 1);
        let candidate = tile.grid.get(candidate_row, candidate_column).unwrap_or(neighbor);
        let candidate_mv = candidate.mv.mv[0];
        let block_mv = block.params.mv.mv[0];
        let difference = (i32::from(candidate_mv.row) - i32::from(block_mv.row)).abs()
            + (i32::from(candidate_mv.column) - i32::from(block_mv.column)).abs();
        let is_valid = difference <= WARP_VALID_THRESHOLD[block.size as usize];
        if !is_valid && self.num_samples_scanned > 1 {
            return;
        }

        let mid_y = 4 * candidate_row + 2 * height4x4 - 1;
        let mid_x = 4 * candidate_column + 2 * width4x4 - 1;
        self.candidates[self.num_warp_samples] = [
            8 * mid_y,
            8 * mid_x,
            8 * mid_y + i32::from(candidate_mv.row),
            8 * mid_x + i32::from(candidate_mv.column),
        ];
        if is_valid {
            self.num_warp_samples += 1;
        }
    }
}

/// 收集块的 warp 样本
///
/// 上方行与左侧列的邻居宽 (高) 不小于当前块时只取一个样本, 否则按邻居尺寸逐个取;
/// 左上角与右上角只在邻居恰好与当前块对齐时探测.
/// 扫描到样本但全部无效时, 有效样本数强制为 1.
pub fn find_warp_samples(block: &Block<'_>) -> WarpSamples {
    let mut samples = WarpSamples::default();
    let tile = &block.tile;
    let header = tile.header;
    let mut top_left = true;
    let mut top_right = true;

    let top = if block.top_available() {
        tile.parameters(block.row4x4 - 1, block.column4x4)
    } else {
        None
    };
    if let Some(source) = top {
        let source_width4x4 = source.size.width4x4() as i32;
        if block.width4x4 <= source_width4x4 {
            let column_offset = -(block.column4x4 & (source_width4x4 - 1));
            if column_offset < 0 {
                top_left = false;
            }
            if column_offset + source_width4x4 > block.width4x4 {
                top_right = false;
            }
            samples.add(block, -1, 0);
        } else {
            let end = block.width4x4.min(header.columns4x4 as i32 - block.column4x4);
            let mut i = 0;
            while i < end {
                let Some(source) = tile.parameters(block.row4x4 - 1, block.column4x4 + i) else {
                    break;
                };
                let step = block.width4x4.min(source.size.width4x4() as i32);
                samples.add(block, -1, i);
                i += step;
            }
        }
    }

    let left = if block.left_available() {
        tile.parameters(block.row4x4, block.column4x4 - 1)
    } else {
        None
    };
    if let Some(source) = left {
        let source_height4x4 = source.size.height4x4() as i32;
        if block.height4x4 <= source_height4x4 {
            let row_offset = -(block.row4x4 & (source_height4x4 - 1));
            if row_offset < 0 {
                top_left = false;
            }
            samples.add(block, 0, -1);
        } else {
            let end = block.height4x4.min(header.rows4x4 as i32 - block.row4x4);
            let mut i = 0;
            while i < end {
                let Some(source) = tile.parameters(block.row4x4 + i, block.column4x4 - 1) else {
                    break;
                };
                let step = block.height4x4.min(source.size.height4x4() as i32);
                samples.add(block, i, -1);
                i += step;
            }
        }
    }

    if top_left {
        samples.add(block, -1, -1);
    }
    if top_right && block.size <= BlockSize::Block64x64 {
        samples.add(block, -1, block.width4x4);
    }
    if samples.num_warp_samples == 0 && samples.num_samples_scanned > 0 {
        samples.num_warp_samples = 1;
    }
    samples
}
