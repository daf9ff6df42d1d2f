//! 时域运动场.
//!
//! - [`TemporalMotionField`]: 当前帧的投影结果, 8x8 粒度, 由投影器逐帧重建,
//!   块解码期间只读.
//! - [`SavedMotionField`]: 已解码帧保存下来的运动场, 作为后续帧的投影源.

use av1mv_core::reference_frame::{NUM_REFERENCE_FRAME_TYPES, ReferenceFrameType};
use av1mv_core::{MotionVector, MvError, MvResult};

use crate::block_grid::BlockGrid;
use crate::frame_header::FrameHeader;
use crate::projection::MAX_FRAME_DISTANCE;

/// 保存运动场时允许的最大分量幅度
pub const REF_MVS_LIMIT: i32 = (1 << 12) - 1;

/// 当前帧的时域运动场
///
/// `mv` 与 `reference_offset` 形状相同, 行跨度为 `columns()`.
/// 未被任何参考帧写入的位置保持 [`MotionVector::INVALID`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalMotionField {
    rows: usize,
    columns: usize,
    mv: Vec<MotionVector>,
    reference_offset: Vec<i8>,
}

impl TemporalMotionField {
    pub fn new(rows8x8: usize, columns8x8: usize) -> MvResult<Self> {
        if rows8x8 == 0 || columns8x8 == 0 {
            return Err(MvError::InvalidArgument(format!(
                "运动场尺寸不能为 0: {rows8x8}x{columns8x8}"
            )));
        }
        let len = rows8x8 * columns8x8;
        Ok(Self {
            rows: rows8x8,
            columns: columns8x8,
            mv: vec![MotionVector::INVALID; len],
            reference_offset: vec![0; len],
        })
    }

    /// 按帧尺寸创建: `rows4x4 / 2 x columns4x4 / 2`
    pub fn for_frame(header: &FrameHeader) -> MvResult<Self> {
        Self::new(header.rows4x4 / 2, header.columns4x4 / 2)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 列数, 同时也是行跨度
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// 读取 `(y8, x8)` 处的运动向量与参考距离
    pub fn get(&self, y8: i32, x8: i32) -> Option<(MotionVector, i8)> {
        let index = self.index(y8, x8)?;
        Some((self.mv[index], self.reference_offset[index]))
    }

    pub fn mv(&self, y8: i32, x8: i32) -> Option<MotionVector> {
        self.index(y8, x8).map(|i| self.mv[i])
    }

    pub fn reference_offset(&self, y8: i32, x8: i32) -> Option<i8> {
        self.index(y8, x8).map(|i| self.reference_offset[i])
    }

    /// 写入一个位置
    ///
    /// 参考距离必须在 `1..=MAX_FRAME_DISTANCE` 内, 与投影器写入的值域一致.
    pub fn set(&mut self, y8: usize, x8: usize, mv: MotionVector, offset: i8) -> MvResult<()> {
        if !(1..=MAX_FRAME_DISTANCE).contains(&i32::from(offset)) {
            return Err(MvError::InvalidArgument(format!("参考距离超出范围: {offset}")));
        }
        if y8 >= self.rows || x8 >= self.columns {
            return Err(MvError::OutOfRange {
                row: y8,
                column: x8,
                rows: self.rows,
                columns: self.columns,
            });
        }
        let index = y8 * self.columns + x8;
        self.mv[index] = mv;
        self.reference_offset[index] = offset;
        Ok(())
    }

    /// 有效 (已被投影写入) 的位置数
    pub fn valid_count(&self) -> usize {
        self.mv.iter().filter(|mv| !mv.is_invalid()).count()
    }

    /// 整个运动场恢复为无效哨兵
    pub fn reset(&mut self) {
        self.mv.fill(MotionVector::INVALID);
        self.reference_offset.fill(0);
    }

    fn index(&self, y8: i32, x8: i32) -> Option<usize> {
        let y8 = usize::try_from(y8).ok()?;
        let x8 = usize::try_from(x8).ok()?;
        (y8 < self.rows && x8 < self.columns).then(|| y8 * self.columns + x8)
    }

    /// 行 `[y8_start, y8_end)` 的可写视图
    pub(crate) fn rows_mut(&mut self, y8_start: usize, y8_end: usize) -> MotionFieldRows<'_> {
        let y8_end = y8_end.min(self.rows);
        let y8_start = y8_start.min(y8_end);
        let range = y8_start * self.columns..y8_end * self.columns;
        MotionFieldRows {
            first_row: y8_start,
            columns: self.columns,
            mv: &mut self.mv[range.clone()],
            reference_offset: &mut self.reference_offset[range],
        }
    }

    /// 按 `rows_per_band` 行切分的互不重叠的可写视图, 供并行投影使用
    pub(crate) fn bands_mut(
        &mut self,
        rows_per_band: usize,
    ) -> impl rayon::iter::IndexedParallelIterator<Item = MotionFieldRows<'_>> {
        use rayon::prelude::*;

        let columns = self.columns;
        let chunk = rows_per_band * columns;
        self.mv
            .par_chunks_mut(chunk)
            .zip(self.reference_offset.par_chunks_mut(chunk))
            .enumerate()
            .map(move |(band, (mv, reference_offset))| MotionFieldRows {
                first_row: band * rows_per_band,
                columns,
                mv,
                reference_offset,
            })
    }
}

/// 运动场中连续若干行的可写视图
#[derive(Debug)]
pub(crate) struct MotionFieldRows<'a> {
    first_row: usize,
    columns: usize,
    mv: &'a mut [MotionVector],
    reference_offset: &'a mut [i8],
}

impl MotionFieldRows<'_> {
    pub(crate) fn first_row(&self) -> usize {
        self.first_row
    }

    pub(crate) fn end_row(&self) -> usize {
        self.first_row + self.mv.len() / self.columns
    }

    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    /// 重置视图内 `[x8_start, x8_end)` 列为无效哨兵
    pub(crate) fn reset_columns(&mut self, x8_start: usize, x8_end: usize) {
        let x8_end = x8_end.min(self.columns);
        if x8_start >= x8_end {
            return;
        }
        for row in 0..self.mv.len() / self.columns {
            let base = row * self.columns;
            self.mv[base + x8_start..base + x8_end].fill(MotionVector::INVALID);
            self.reference_offset[base + x8_start..base + x8_end].fill(0);
        }
    }

    /// 写入绝对坐标 `(y8, x8)`, 调用方保证坐标落在视图内
    pub(crate) fn write(&mut self, y8: usize, x8: usize, mv: MotionVector, offset: i8) {
        let index = (y8 - self.first_row) * self.columns + x8;
        self.mv[index] = mv;
        self.reference_offset[index] = offset;
    }
}

/// 已解码帧保存的运动场 (8x8 粒度), 供后续帧投影
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMotionField {
    rows4x4: usize,
    columns4x4: usize,
    is_intra_frame: bool,
    order_hint: u32,
    order_hints: [u32; NUM_REFERENCE_FRAME_TYPES],
    reference_frame: Vec<ReferenceFrameType>,
    mv: Vec<MotionVector>,
}

impl SavedMotionField {
    /// 空运动场: 所有位置都不可用于投影
    pub fn new(rows4x4: usize, columns4x4: usize) -> MvResult<Self> {
        if rows4x4 < 2 || columns4x4 < 2 {
            return Err(MvError::InvalidArgument(format!(
                "保存的运动场尺寸过小: {rows4x4}x{columns4x4}"
            )));
        }
        let len = (rows4x4 / 2) * (columns4x4 / 2);
        Ok(Self {
            rows4x4,
            columns4x4,
            is_intra_frame: false,
            order_hint: 0,
            order_hints: [0; NUM_REFERENCE_FRAME_TYPES],
            reference_frame: vec![ReferenceFrameType::Intra; len],
            mv: vec![MotionVector::ZERO; len],
        })
    }

    /// 从已解码帧的块网格提取运动场
    ///
    /// 每个 8x8 单元取其右下 4x4 单元 (奇数坐标) 所属块的运动信息,
    /// 依次尝试第二、第一参考, 只保留指向过去帧且幅度不超过 [`REF_MVS_LIMIT`] 的向量.
    pub fn store(header: &FrameHeader, grid: &BlockGrid, is_intra_frame: bool) -> MvResult<Self> {
        if grid.rows4x4() != header.rows4x4 || grid.columns4x4() != header.columns4x4 {
            return Err(MvError::InvalidData(format!(
                "块网格 {}x{} 与帧尺寸 {}x{} 不一致",
                grid.rows4x4(),
                grid.columns4x4(),
                header.rows4x4,
                header.columns4x4
            )));
        }
        let mut field = Self::new(header.rows4x4, header.columns4x4)?;
        field.is_intra_frame = is_intra_frame;
        field.order_hint = header.order_hint;
        for reference in ReferenceFrameType::INTER {
            if let Some(index) = reference.index() {
                field.order_hints[index] = header.reference_order_hint(reference);
            }
        }
        if is_intra_frame {
            return Ok(field);
        }

        let columns8x8 = field.columns8x8();
        for y8 in 0..field.rows8x8() {
            for x8 in 0..columns8x8 {
                let row4x4 = (2 * y8 + 1) as i32;
                let column4x4 = (2 * x8 + 1) as i32;
                let Some(bp) = grid.get(row4x4, column4x4) else {
                    continue;
                };
                for list in [1, 0] {
                    let reference = bp.reference_frame[list];
                    if !reference.is_inter() {
                        continue;
                    }
                    let reference_hint = header.reference_order_hint(reference);
                    if header.relative_distance(reference_hint, header.order_hint) >= 0 {
                        continue;
                    }
                    let mv = bp.mv.mv[list];
                    if i32::from(mv.row).abs() > REF_MVS_LIMIT
                        || i32::from(mv.column).abs() > REF_MVS_LIMIT
                    {
                        continue;
                    }
                    let index = y8 * columns8x8 + x8;
                    field.reference_frame[index] = reference;
                    field.mv[index] = mv;
                    break;
                }
            }
        }
        Ok(field)
    }

    pub fn with_order_hints(
        mut self,
        order_hint: u32,
        references: &[(ReferenceFrameType, u32)],
    ) -> MvResult<Self> {
        self.order_hint = order_hint;
        for &(reference, hint) in references {
            let index = reference
                .index()
                .filter(|_| reference.is_inter())
                .ok_or_else(|| {
                    MvError::InvalidArgument(format!("不是帧间参考类型: {reference:?}"))
                })?;
            self.order_hints[index] = hint;
        }
        Ok(self)
    }

    pub fn set_intra_frame(&mut self, is_intra_frame: bool) {
        self.is_intra_frame = is_intra_frame;
    }

    /// 写入一个 8x8 单元的运动信息
    pub fn set(
        &mut self,
        y8: usize,
        x8: usize,
        reference: ReferenceFrameType,
        mv: MotionVector,
    ) -> MvResult<()> {
        if y8 >= self.rows8x8() || x8 >= self.columns8x8() {
            return Err(MvError::OutOfRange {
                row: y8,
                column: x8,
                rows: self.rows8x8(),
                columns: self.columns8x8(),
            });
        }
        let index = y8 * self.columns8x8() + x8;
        self.reference_frame[index] = reference;
        self.mv[index] = mv;
        Ok(())
    }

    pub fn rows4x4(&self) -> usize {
        self.rows4x4
    }

    pub fn columns4x4(&self) -> usize {
        self.columns4x4
    }

    pub fn rows8x8(&self) -> usize {
        self.rows4x4 / 2
    }

    pub fn columns8x8(&self) -> usize {
        self.columns4x4 / 2
    }

    pub fn is_intra_frame(&self) -> bool {
        self.is_intra_frame
    }

    /// 该帧自身的 order hint
    pub fn order_hint(&self) -> u32 {
        self.order_hint
    }

    /// 该帧解码时各参考帧类型的 order hint
    pub fn reference_order_hint(&self, reference: ReferenceFrameType) -> u32 {
        reference.index().map(|i| self.order_hints[i]).unwrap_or(0)
    }

    pub fn reference_frame(&self, y8: usize, x8: usize) -> ReferenceFrameType {
        self.reference_frame[y8 * self.columns8x8() + x8]
    }

    pub fn mv(&self, y8: usize, x8: usize) -> MotionVector {
        self.mv[y8 * self.columns8x8() + x8]
    }

    /// 可作为投影源的位置数
    pub fn usable_count(&self) -> usize {
        self.reference_frame.iter().filter(|r| r.is_inter()).count()
    }
}
