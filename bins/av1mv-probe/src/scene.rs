//! JSON 场景描述, 以及到预测引擎类型的转换.
//!
//! 一个场景包含当前帧的帧头, 参考帧缓冲中已保存的运动场, 以及按解码顺序排列的块.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use av1mv_core::reference_frame::NUM_INTER_REFERENCE_FRAME_TYPES;
use av1mv_core::{
    BlockSize, CompoundMotionVector, GlobalMotion, GlobalMotionType, MotionVector,
    PredictionMode, ReferenceFrameType,
};
use av1mv_predict::frame_header::NUM_REFERENCE_SLOTS;
use av1mv_predict::{BlockParameters, FrameHeader, SavedMotionField};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub frame: FrameDesc,
    #[serde(default)]
    pub reference_frames: Vec<ReferenceFrameDesc>,
    #[serde(default)]
    pub blocks: Vec<BlockDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameDesc {
    pub rows4x4: usize,
    pub columns4x4: usize,
    #[serde(default = "default_true")]
    pub allow_high_precision_mv: bool,
    #[serde(default)]
    pub force_integer_mv: bool,
    #[serde(default)]
    pub use_ref_frame_mvs: bool,
    #[serde(default)]
    pub order_hint_bits: u32,
    #[serde(default)]
    pub order_hint: u32,
    /// 参考帧类型名 -> order hint
    #[serde(default)]
    pub references: BTreeMap<String, u32>,
    /// Last..Alt 对应的缓冲槽, 缺省为 0..7
    #[serde(default)]
    pub reference_frame_index: Option<[usize; NUM_INTER_REFERENCE_FRAME_TYPES]>,
    #[serde(default)]
    pub global_motion: Vec<GlobalMotionDesc>,
    /// 保存运动场时是否按帧内帧处理
    #[serde(default)]
    pub is_intra_frame: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalMotionDesc {
    pub reference: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub params: [i32; 6],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceFrameDesc {
    pub slot: usize,
    /// 缺省与当前帧相同
    #[serde(default)]
    pub rows4x4: Option<usize>,
    #[serde(default)]
    pub columns4x4: Option<usize>,
    pub order_hint: u32,
    #[serde(default)]
    pub intra: bool,
    #[serde(default)]
    pub references: BTreeMap<String, u32>,
    #[serde(default)]
    pub motion: Vec<SavedMotionDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedMotionDesc {
    pub y8: usize,
    pub x8: usize,
    pub reference: String,
    pub mv: [i16; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDesc {
    pub row4x4: usize,
    pub column4x4: usize,
    pub size: String,
    /// 空表示帧内块
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub mv: Vec<[i16; 2]>,
    #[serde(default)]
    pub mode: Option<String>,
    /// 是否收集 warp 样本
    #[serde(default)]
    pub warp: bool,
}

pub fn parse_reference(name: &str) -> Result<ReferenceFrameType> {
    match ReferenceFrameType::from_name(name) {
        Some(reference) if reference.is_inter() => Ok(reference),
        _ => bail!("未知的帧间参考类型: {name}"),
    }
}

fn parse_references(map: &BTreeMap<String, u32>) -> Result<Vec<(ReferenceFrameType, u32)>> {
    map.iter()
        .map(|(name, &hint)| Ok((parse_reference(name)?, hint)))
        .collect()
}

impl FrameDesc {
    pub fn to_header(&self) -> Result<FrameHeader> {
        let references = parse_references(&self.references)?;
        let mut header = FrameHeader::new(self.rows4x4, self.columns4x4)
            .context("帧尺寸无效")?
            .with_order_hints(self.order_hint_bits, self.order_hint, &references)
            .context("order hint 无效")?;
        header.allow_high_precision_mv = self.allow_high_precision_mv;
        header.force_integer_mv = self.force_integer_mv;
        header.use_ref_frame_mvs = self.use_ref_frame_mvs;
        if let Some(index) = self.reference_frame_index {
            if let Some(slot) = index.iter().find(|&&slot| slot >= NUM_REFERENCE_SLOTS) {
                bail!("缓冲槽下标越界: {slot}");
            }
            header.reference_frame_index = index;
        }
        for desc in &self.global_motion {
            let reference = parse_reference(&desc.reference)?;
            let Some(kind) = GlobalMotionType::from_name(&desc.kind) else {
                bail!("未知的全局运动类型: {}", desc.kind);
            };
            if let Some(index) = reference.index() {
                header.global_motion[index] = GlobalMotion::with_params(kind, desc.params);
            }
        }
        Ok(header)
    }
}

impl ReferenceFrameDesc {
    pub fn to_saved(&self, frame: &FrameDesc) -> Result<SavedMotionField> {
        let rows4x4 = self.rows4x4.unwrap_or(frame.rows4x4);
        let columns4x4 = self.columns4x4.unwrap_or(frame.columns4x4);
        let mut saved = SavedMotionField::new(rows4x4, columns4x4)
            .with_context(|| format!("参考帧 (槽 {}) 尺寸无效", self.slot))?
            .with_order_hints(self.order_hint, &parse_references(&self.references)?)?;
        saved.set_intra_frame(self.intra);
        for motion in &self.motion {
            let reference = parse_reference(&motion.reference)?;
            let mv = MotionVector::from_components(motion.mv);
            saved
                .set(motion.y8, motion.x8, reference, mv)
                .with_context(|| format!("参考帧 (槽 {}) 运动信息无效", self.slot))?;
        }
        Ok(saved)
    }
}

impl Scene {
    /// 按缓冲槽排列的参考帧
    pub fn reference_slots(&self) -> Result<Vec<Option<SavedMotionField>>> {
        let mut slots = vec![None; NUM_REFERENCE_SLOTS];
        for desc in &self.reference_frames {
            let Some(slot) = slots.get_mut(desc.slot) else {
                bail!("缓冲槽下标越界: {}", desc.slot);
            };
            if slot.is_some() {
                bail!("缓冲槽 {} 重复定义", desc.slot);
            }
            *slot = Some(desc.to_saved(&self.frame)?);
        }
        Ok(slots)
    }
}

impl BlockDesc {
    pub fn block_size(&self) -> Result<BlockSize> {
        BlockSize::from_name(&self.size).with_context(|| format!("未知的块尺寸: {}", self.size))
    }

    pub fn to_parameters(&self) -> Result<BlockParameters> {
        let size = self.block_size()?;
        let mode = match &self.mode {
            Some(name) => Some(
                PredictionMode::from_name(name)
                    .with_context(|| format!("未知的预测模式: {name}"))?,
            ),
            None => None,
        };
        let references = self
            .references
            .iter()
            .map(|name| parse_reference(name))
            .collect::<Result<Vec<_>>>()?;
        let reference_frame = match references.as_slice() {
            [] => return Ok(BlockParameters::intra(size, mode.unwrap_or_default())),
            [first] => [*first, ReferenceFrameType::None],
            [first, second] => [*first, *second],
            _ => bail!("块最多使用两个参考帧"),
        };
        let is_compound = reference_frame[1].is_inter();
        if self.mv.len() > 2 {
            bail!("块最多携带两个运动向量");
        }
        let mv_at = |i: usize| {
            self.mv
                .get(i)
                .copied()
                .map_or(MotionVector::ZERO, MotionVector::from_components)
        };
        let mode = mode.unwrap_or(if is_compound {
            PredictionMode::NewNewMv
        } else {
            PredictionMode::NewMv
        });
        if !mode.is_inter() || mode.is_compound() != is_compound {
            bail!("预测模式 {mode} 与参考帧数量不匹配");
        }
        Ok(BlockParameters::inter(
            size,
            reference_frame,
            CompoundMotionVector::new(mv_at(0), mv_at(1)),
            mode,
        ))
    }
}
