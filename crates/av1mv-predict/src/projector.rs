//! 时域运动场投影.
//!
//! 每帧解码前运行一次: 按 Last, BackwardAlt, Alt2, Alt, Last2 的顺序,
//! 把各参考帧保存的运动场沿其运动轨迹投影到当前帧的 8x8 网格上.
//! 后投影的参考帧可以覆盖先前写入的位置.
//!
//! 投影只写入调用方指定的行范围, 因此可以按 8 行一组并行执行.

use av1mv_core::reference_frame::NUM_REFERENCE_FRAME_TYPES;
use av1mv_core::{MvError, MvResult, ReferenceFrameType};
use log::{debug, trace};
use rayon::prelude::*;

use crate::frame_header::{FrameHeader, TileBounds};
use crate::motion_field::{MotionFieldRows, SavedMotionField, TemporalMotionField};
use crate::projection::{
    get_mv_projection, project, MAX_FRAME_DISTANCE, PROJECTION_MV_MAX_HORIZONTAL_OFFSET,
};

/// 并行投影时每个任务处理的 8x8 行数
pub const PROJECTION_BAND_ROWS: usize = 8;

/// 一次投影中通过兼容性检查并参与投影的参考帧
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionSummary {
    contributed: [bool; NUM_REFERENCE_FRAME_TYPES],
}

impl ProjectionSummary {
    pub fn contributed(&self, reference: ReferenceFrameType) -> bool {
        reference.index().is_some_and(|i| self.contributed[i])
    }

    /// 参与投影的参考帧, 按参考帧类型排序
    pub fn references(&self) -> impl Iterator<Item = ReferenceFrameType> + '_ {
        ReferenceFrameType::INTER
            .into_iter()
            .filter(|&reference| self.contributed(reference))
    }

    pub fn count(&self) -> usize {
        self.contributed.iter().filter(|&&c| c).count()
    }

    fn mark(&mut self, reference: ReferenceFrameType) {
        if let Some(i) = reference.index() {
            self.contributed[i] = true;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.contributed.iter_mut().zip(other.contributed) {
            *a |= b;
        }
        self
    }
}

/// 投影区域, 8x8 单元坐标, 左闭右开
#[derive(Debug, Clone, Copy)]
struct Region {
    y8_start: usize,
    y8_end: usize,
    x8_start: i32,
    x8_end: i32,
}

impl Region {
    fn from_bounds(header: &FrameHeader, bounds: TileBounds) -> MvResult<Self> {
        if bounds.row4x4_start < 0 || bounds.column4x4_start < 0 {
            return Err(MvError::InvalidArgument(format!(
                "投影区域起点不能为负: ({}, {})",
                bounds.row4x4_start, bounds.column4x4_start
            )));
        }
        let y8_start = (bounds.row4x4_start / 2) as usize;
        if y8_start % PROJECTION_BAND_ROWS != 0 {
            return Err(MvError::InvalidArgument(format!(
                "投影区域起始行必须按 64 像素对齐: row4x4 = {}",
                bounds.row4x4_start
            )));
        }
        let y8_end = (bounds.row4x4_end.min(header.rows4x4 as i32) / 2).max(0) as usize;
        let x8_start = bounds.column4x4_start / 2;
        let x8_end = bounds.column4x4_end.min(header.columns4x4 as i32) / 2;
        Ok(Self {
            y8_start,
            y8_end,
            x8_start,
            x8_end,
        })
    }
}

fn check_field(header: &FrameHeader, field: &TemporalMotionField) -> MvResult<()> {
    let rows = header.rows4x4 / 2;
    let columns = header.columns4x4 / 2;
    if field.rows() != rows || field.columns() != columns {
        return Err(MvError::InvalidData(format!(
            "运动场 {}x{} 与帧尺寸 {}x{} 不一致",
            field.rows(),
            field.columns(),
            rows,
            columns
        )));
    }
    Ok(())
}

/// 是否需要投影: 帧头启用了时域运动场且 order hint 可用
fn projection_enabled(header: &FrameHeader) -> bool {
    header.use_ref_frame_mvs && header.order_hint_bits() != 0
}

/// 为当前帧 (或其中一个 tile 行范围) 建立时域运动场
///
/// 先把区域内的位置重置为无效哨兵, 再依次投影各参考帧.
/// `references` 按缓冲槽下标索引, 缺失的槽位对应的参考帧被跳过.
pub fn setup_motion_field(
    header: &FrameHeader,
    references: &[Option<SavedMotionField>],
    bounds: TileBounds,
    field: &mut TemporalMotionField,
) -> MvResult<ProjectionSummary> {
    check_field(header, field)?;
    let region = Region::from_bounds(header, bounds)?;
    let mut rows = field.rows_mut(region.y8_start, region.y8_end);
    rows.reset_columns(region.x8_start.max(0) as usize, region.x8_end.max(0) as usize);
    if !projection_enabled(header) {
        return Ok(ProjectionSummary::default());
    }
    let summary = project_rows(header, references, region.x8_start, region.x8_end, &mut rows);
    debug!(
        "运动场投影: 行 [{}, {}) 参与的参考帧 {:?}",
        region.y8_start,
        region.y8_end,
        summary.references().collect::<Vec<_>>()
    );
    Ok(summary)
}

/// 按 8 行一组并行建立整帧的时域运动场, 结果与顺序执行一致
pub fn project_motion_field_parallel(
    header: &FrameHeader,
    references: &[Option<SavedMotionField>],
    field: &mut TemporalMotionField,
) -> MvResult<ProjectionSummary> {
    check_field(header, field)?;
    let columns = field.columns();
    let enabled = projection_enabled(header);
    let summary = field
        .bands_mut(PROJECTION_BAND_ROWS)
        .map(|mut band| {
            band.reset_columns(0, columns);
            if enabled {
                project_rows(header, references, 0, columns as i32, &mut band)
            } else {
                ProjectionSummary::default()
            }
        })
        .reduce(ProjectionSummary::default, ProjectionSummary::merge);
    debug!(
        "并行运动场投影: 参与的参考帧 {:?}",
        summary.references().collect::<Vec<_>>()
    );
    Ok(summary)
}

/// 按优先级投影各参考帧
///
/// BackwardAlt 与 Alt2 都投影成功后, Alt 与 Last2 不再参与.
fn project_rows(
    header: &FrameHeader,
    references: &[Option<SavedMotionField>],
    x8_start: i32,
    x8_end: i32,
    rows: &mut MotionFieldRows<'_>,
) -> ProjectionSummary {
    let mut summary = ProjectionSummary::default();
    let mut run = |source: ReferenceFrameType, offset: i32, dst_sign: i32| {
        let contributed = project_reference(
            header, references, source, offset, dst_sign, x8_start, x8_end, rows,
        );
        if contributed {
            summary.mark(source);
        }
        contributed
    };
    let distance_to = |reference: ReferenceFrameType| {
        header.relative_distance(header.reference_order_hint(reference), header.order_hint)
    };

    let last_alternate_hint = source_frame(header, references, ReferenceFrameType::Last)
        .map(|last| last.reference_order_hint(ReferenceFrameType::Alt));
    let golden_hint = header.reference_order_hint(ReferenceFrameType::Golden);
    match last_alternate_hint {
        Some(hint) if hint != golden_hint => {
            let offset = -distance_to(ReferenceFrameType::Last);
            if offset.abs() <= MAX_FRAME_DISTANCE {
                run(ReferenceFrameType::Last, offset, -1);
            }
        }
        Some(_) => trace!("Last 的 Alt 与当前 Golden 相同, 跳过 Last"),
        None => trace!("Last 参考帧缺失"),
    }

    let mut ref_stamp = 1;
    for source in [ReferenceFrameType::BackwardAlt, ReferenceFrameType::Alt2] {
        let offset = distance_to(source);
        if offset > 0 && run(source, offset, 0) {
            ref_stamp -= 1;
        }
    }
    if ref_stamp >= 0 {
        let offset = distance_to(ReferenceFrameType::Alt);
        if offset > 0 && run(ReferenceFrameType::Alt, offset, 0) {
            ref_stamp -= 1;
        }
    }
    if ref_stamp >= 0 {
        let offset = -distance_to(ReferenceFrameType::Last2);
        if offset.abs() <= MAX_FRAME_DISTANCE {
            run(ReferenceFrameType::Last2, offset, -1);
        }
    }
    summary
}

fn source_frame<'a>(
    header: &FrameHeader,
    references: &'a [Option<SavedMotionField>],
    source: ReferenceFrameType,
) -> Option<&'a SavedMotionField> {
    header
        .reference_slot(source)
        .and_then(|slot| references.get(slot))
        .and_then(Option::as_ref)
}

/// 投影单个参考帧, 返回该参考帧是否可用
///
/// 距离超出 [`MAX_FRAME_DISTANCE`] 时视为可用但不写入任何位置.
#[allow(clippy::too_many_arguments)]
fn project_reference(
    header: &FrameHeader,
    references: &[Option<SavedMotionField>],
    source: ReferenceFrameType,
    reference_to_current_with_sign: i32,
    dst_sign: i32,
    x8_start: i32,
    x8_end: i32,
    rows: &mut MotionFieldRows<'_>,
) -> bool {
    let Some(saved) = source_frame(header, references, source) else {
        trace!("{} 参考帧缺失", source.name());
        return false;
    };
    if saved.rows4x4() != header.rows4x4
        || saved.columns4x4() != header.columns4x4
        || saved.is_intra_frame()
    {
        trace!("{} 尺寸不一致或为帧内帧, 跳过", source.name());
        return false;
    }
    if reference_to_current_with_sign > MAX_FRAME_DISTANCE {
        return true;
    }

    // 源帧到其各参考帧的距离, 0 表示跳过
    let source_hint = header.reference_order_hint(source);
    let mut offsets = [0i32; NUM_REFERENCE_FRAME_TYPES];
    for reference in ReferenceFrameType::INTER {
        if let Some(i) = reference.index() {
            let offset =
                header.relative_distance(source_hint, saved.reference_order_hint(reference));
            if (1..=MAX_FRAME_DISTANCE).contains(&offset) {
                offsets[i] = offset;
            }
        }
    }

    let columns = rows.columns() as i32;
    let read_start = (x8_start - PROJECTION_MV_MAX_HORIZONTAL_OFFSET).max(0);
    let read_end = (x8_end + PROJECTION_MV_MAX_HORIZONTAL_OFFSET).min(columns);
    let y8_end = rows.end_row() as i32;
    for y8 in rows.first_row()..rows.end_row() {
        let row = y8 as i32;
        let y8_floor = (row & !7) - row;
        let y8_ceiling = (y8_end - row).min(y8_floor + 8);
        for x8 in read_start..read_end {
            let offset = saved
                .reference_frame(y8, x8 as usize)
                .index()
                .map_or(0, |i| offsets[i]);
            if offset == 0 {
                continue;
            }
            let mv = saved.mv(y8, x8 as usize);
            let projection = get_mv_projection(mv, reference_to_current_with_sign, offset);
            let position_y8 = project(0, projection.row, dst_sign);
            if position_y8 < y8_floor || position_y8 >= y8_ceiling {
                continue;
            }
            let x8_base = x8 & !7;
            let x8_floor = x8_start.max(x8_base - PROJECTION_MV_MAX_HORIZONTAL_OFFSET);
            let x8_ceiling = x8_end.min(x8_base + 8 + PROJECTION_MV_MAX_HORIZONTAL_OFFSET);
            let position_x8 = project(x8, projection.column, dst_sign);
            if position_x8 < x8_floor || position_x8 >= x8_ceiling {
                continue;
            }
            rows.write(
                (row + position_y8) as usize,
                position_x8 as usize,
                mv,
                offset as i8,
            );
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use av1mv_core::MotionVector;

    const LAST: ReferenceFrameType = ReferenceFrameType::Last;
    const BWD: ReferenceFrameType = ReferenceFrameType::BackwardAlt;
    const ALT2: ReferenceFrameType = ReferenceFrameType::Alt2;
    const ALT: ReferenceFrameType = ReferenceFrameType::Alt;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// 32x32 个 4x4 单元, 当前帧 order hint 为 8
    fn header(references: &[(ReferenceFrameType, u32)]) -> FrameHeader {
        let mut header = FrameHeader::new(32, 32)
            .unwrap()
            .with_order_hints(7, 8, references)
            .unwrap();
        header.use_ref_frame_mvs = true;
        header
    }

    /// 缓冲槽与参考帧类型一一对应 (默认 reference_frame_index)
    fn slots(
        frames: Vec<(ReferenceFrameType, SavedMotionField)>,
    ) -> Vec<Option<SavedMotionField>> {
        let mut slots = vec![None; 8];
        for (reference, frame) in frames {
            let slot = reference.index().unwrap() - 1;
            slots[slot] = Some(frame);
        }
        slots
    }

    /// order hint 为 `hint` 的已解码帧, 其 Last 参考位于 `last_hint`
    fn saved(hint: u32, last_hint: u32) -> SavedMotionField {
        SavedMotionField::new(32, 32)
            .unwrap()
            .with_order_hints(hint, &[(LAST, last_hint)])
            .unwrap()
    }

    #[test]
    fn test_empty_saved_field_writes_nothing() {
        let header = header(&[(BWD, 10)]);
        let references = slots(vec![(BWD, saved(10, 6))]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert!(summary.contributed(BWD));
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_backward_reference_projects_along_trajectory() {
        let header = header(&[(BWD, 10)]);
        let mut bwd = saved(10, 6);
        bwd.set(4, 4, LAST, MotionVector::ZERO).unwrap();
        // 缩放 2/4 后为 (128, -64), 目标位置偏移 (+2, -1)
        bwd.set(2, 3, LAST, MotionVector::new(256, -128)).unwrap();
        let references = slots(vec![(BWD, bwd)]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        setup_motion_field(&header, &references, bounds, &mut field).unwrap();

        assert_eq!(field.get(4, 4), Some((MotionVector::ZERO, 4)));
        assert_eq!(field.get(4, 2), Some((MotionVector::new(256, -128), 4)));
        assert_eq!(field.valid_count(), 2);
    }

    #[test]
    fn test_projection_stays_within_row_group() {
        let header = header(&[(BWD, 10)]);
        let mut bwd = saved(10, 6);
        // 目标行 6 + 4 = 10 越过了 8 行组边界
        bwd.set(6, 4, LAST, MotionVector::new(512, 0)).unwrap();
        let references = slots(vec![(BWD, bwd)]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_source_reference_out_of_range_skipped() {
        let header = header(&[(BWD, 10)]);
        // 源帧的 Last 在其之后: 距离为负, 不投影
        let mut bwd = saved(10, 12);
        bwd.set(4, 4, LAST, MotionVector::ZERO).unwrap();
        let references = slots(vec![(BWD, bwd)]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert!(summary.contributed(BWD));
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_intra_or_mismatched_reference_skipped() {
        init_logger();
        let header = header(&[(BWD, 10), (ALT, 12)]);
        let mut intra = saved(10, 6);
        intra.set(4, 4, LAST, MotionVector::ZERO).unwrap();
        intra.set_intra_frame(true);
        let small = SavedMotionField::new(16, 16).unwrap();
        let references = slots(vec![(BWD, intra), (ALT, small)]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert_eq!(summary.count(), 0);
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_ref_stamp_limits_backward_references() {
        let header = header(&[(BWD, 10), (ALT2, 11), (ALT, 12)]);
        let mut alt = saved(12, 6);
        alt.set(0, 0, LAST, MotionVector::ZERO).unwrap();
        let references = slots(vec![
            (BWD, saved(10, 6)),
            (ALT2, saved(11, 6)),
            (ALT, alt),
        ]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert!(summary.contributed(BWD));
        assert!(summary.contributed(ALT2));
        assert!(!summary.contributed(ALT));
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_last_skipped_when_alternate_matches_golden() {
        init_logger();
        let header = header(&[(LAST, 6), (ReferenceFrameType::Golden, 2)]);
        let mut last = SavedMotionField::new(32, 32)
            .unwrap()
            .with_order_hints(6, &[(LAST, 4), (ALT, 2)])
            .unwrap();
        last.set(4, 4, LAST, MotionVector::ZERO).unwrap();
        let references = slots(vec![(LAST, last.clone())]);
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert!(!summary.contributed(LAST));

        let last = last.with_order_hints(6, &[(ALT, 3)]).unwrap();
        let references = slots(vec![(LAST, last)]);
        let summary = setup_motion_field(&header, &references, bounds, &mut field).unwrap();
        assert!(summary.contributed(LAST));
        assert_eq!(field.get(4, 4), Some((MotionVector::ZERO, 2)));
    }

    #[test]
    fn test_disabled_only_resets() {
        let mut header = header(&[(BWD, 10)]);
        header.use_ref_frame_mvs = false;
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        field.set(1, 1, MotionVector::new(2, 2), 3).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let summary = setup_motion_field(&header, &[], bounds, &mut field).unwrap();
        assert_eq!(summary, ProjectionSummary::default());
        assert_eq!(field.valid_count(), 0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let header = header(&[(BWD, 10)]);
        let mut small = TemporalMotionField::new(4, 4).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        assert!(matches!(
            setup_motion_field(&header, &[], bounds, &mut small),
            Err(MvError::InvalidData(_))
        ));

        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        let misaligned = TileBounds::new(8, 32, 0, 32);
        assert!(matches!(
            setup_motion_field(&header, &[], misaligned, &mut field),
            Err(MvError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut header = FrameHeader::new(80, 48)
            .unwrap()
            .with_order_hints(7, 8, &[(LAST, 6), (BWD, 10), (ALT, 13)])
            .unwrap();
        header.use_ref_frame_mvs = true;
        let mut bwd = SavedMotionField::new(80, 48)
            .unwrap()
            .with_order_hints(10, &[(LAST, 6), (ALT2, 7)])
            .unwrap();
        let mut alt = SavedMotionField::new(80, 48)
            .unwrap()
            .with_order_hints(13, &[(LAST, 9)])
            .unwrap();
        for y8 in 0..40 {
            for x8 in 0..24 {
                let seed = (y8 * 24 + x8) as i16;
                let mv = MotionVector::new((seed % 17 - 8) * 24, (seed % 13 - 6) * 40);
                let reference = if seed % 3 == 0 { ALT2 } else { LAST };
                bwd.set(y8, x8, reference, mv).unwrap();
                if seed % 5 == 0 {
                    alt.set(y8, x8, LAST, mv.negated()).unwrap();
                }
            }
        }
        let references = slots(vec![(BWD, bwd), (ALT, alt)]);

        let mut sequential = TemporalMotionField::for_frame(&header).unwrap();
        let bounds = TileBounds::whole_frame(&header);
        let expected =
            setup_motion_field(&header, &references, bounds, &mut sequential).unwrap();
        let mut parallel = TemporalMotionField::for_frame(&header).unwrap();
        let summary = project_motion_field_parallel(&header, &references, &mut parallel).unwrap();

        assert_eq!(summary, expected);
        assert!(sequential.valid_count() > 0);
        assert_eq!(parallel, sequential);
    }
}
