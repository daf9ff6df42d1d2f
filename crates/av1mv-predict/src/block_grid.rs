//! 块参数网格.
//!
//! 每个已解码块的参数按值存放在 arena 中, 4x4 网格的每个单元只记录所属块的下标.
//! 邻居查找通过整数坐标完成, 块之间不共享可变引用.

use av1mv_core::{
    BlockSize, CompoundMotionVector, MvError, MvResult, PredictionMode, ReferenceFrameType,
};

use crate::prediction::PredictionParameters;

/// 网格中块的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 单个编码块的参数, 解码完成后不再修改
#[derive(Debug, Clone)]
pub struct BlockParameters {
    pub size: BlockSize,
    pub reference_frame: [ReferenceFrameType; 2],
    pub mv: CompoundMotionVector,
    pub y_mode: PredictionMode,
    pub is_inter: bool,
    /// 使用全局运动作为预测且宽高都不小于 8
    pub is_global_mv_block: bool,
    pub prediction_parameters: PredictionParameters,
}

impl BlockParameters {
    /// 帧内块
    pub fn intra(size: BlockSize, y_mode: PredictionMode) -> Self {
        Self {
            size,
            reference_frame: [ReferenceFrameType::Intra, ReferenceFrameType::None],
            mv: CompoundMotionVector::ZERO,
            y_mode,
            is_inter: false,
            is_global_mv_block: false,
            prediction_parameters: PredictionParameters::default(),
        }
    }

    /// 帧间块, 单参考时 `reference_frame[1]` 为 `None`
    pub fn inter(
        size: BlockSize,
        reference_frame: [ReferenceFrameType; 2],
        mv: CompoundMotionVector,
        y_mode: PredictionMode,
    ) -> Self {
        let is_global_mv_block = y_mode.is_global() && size.width().min(size.height()) >= 8;
        Self {
            size,
            reference_frame,
            mv,
            y_mode,
            is_inter: true,
            is_global_mv_block,
            prediction_parameters: PredictionParameters::default(),
        }
    }

    pub fn is_compound(&self) -> bool {
        self.reference_frame[1].is_inter()
    }
}

/// 整帧的块参数网格 (4x4 粒度)
#[derive(Debug, Clone)]
pub struct BlockGrid {
    rows4x4: usize,
    columns4x4: usize,
    blocks: Vec<BlockParameters>,
    cells: Vec<Option<BlockId>>,
}

impl BlockGrid {
    pub fn new(rows4x4: usize, columns4x4: usize) -> MvResult<Self> {
        if rows4x4 == 0 || columns4x4 == 0 {
            return Err(MvError::InvalidArgument(format!(
                "网格尺寸不能为 0: {rows4x4}x{columns4x4}"
            )));
        }
        Ok(Self {
            rows4x4,
            columns4x4,
            blocks: Vec::new(),
            cells: vec![None; rows4x4 * columns4x4],
        })
    }

    pub fn rows4x4(&self) -> usize {
        self.rows4x4
    }

    pub fn columns4x4(&self) -> usize {
        self.columns4x4
    }

    /// 已登记的块数
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 登记一个已解码块, 覆盖其在帧内的全部 4x4 单元
    ///
    /// 块原点必须按块尺寸对齐, 超出帧右/下边界的部分被裁掉.
    pub fn insert(
        &mut self,
        row4x4: usize,
        column4x4: usize,
        params: BlockParameters,
    ) -> MvResult<BlockId> {
        if row4x4 >= self.rows4x4 || column4x4 >= self.columns4x4 {
            return Err(MvError::OutOfRange {
                row: row4x4,
                column: column4x4,
                rows: self.rows4x4,
                columns: self.columns4x4,
            });
        }
        let width4x4 = params.size.width4x4();
        let height4x4 = params.size.height4x4();
        if row4x4 % height4x4 != 0 || column4x4 % width4x4 != 0 {
            return Err(MvError::InvalidArgument(format!(
                "块 {} 的原点 ({row4x4}, {column4x4}) 未按尺寸对齐",
                params.size
            )));
        }
        let id = BlockId(u32::try_from(self.blocks.len()).map_err(|_| {
            MvError::Internal("块数量超出 u32 范围".to_string())
        })?);
        self.blocks.push(params);
        let row_end = (row4x4 + height4x4).min(self.rows4x4);
        let column_end = (column4x4 + width4x4).min(self.columns4x4);
        for row in row4x4..row_end {
            let base = row * self.columns4x4;
            self.cells[base + column4x4..base + column_end].fill(Some(id));
        }
        Ok(id)
    }

    /// 坐标处的块下标, 越界或尚未解码时为 `None`
    pub fn id_at(&self, row4x4: i32, column4x4: i32) -> Option<BlockId> {
        let row = usize::try_from(row4x4).ok()?;
        let column = usize::try_from(column4x4).ok()?;
        if row >= self.rows4x4 || column >= self.columns4x4 {
            return None;
        }
        self.cells[row * self.columns4x4 + column]
    }

    /// 坐标处的块参数
    pub fn get(&self, row4x4: i32, column4x4: i32) -> Option<&BlockParameters> {
        self.id_at(row4x4, column4x4).map(|id| &self.blocks[id.index()])
    }

    pub fn block(&self, id: BlockId) -> &BlockParameters {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BlockParameters {
        &mut self.blocks[id.index()]
    }

    /// 清空全部块 (帧间复用网格)
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.cells.fill(None);
    }
}
