//! 动作分析 WASM 绑定
//!
//! 把 `rep-motion` 的逐帧引擎暴露给浏览器端。每个 [`MotionAnalyzer`]
//! 对应一次训练会话，由调用方持有并在结束时释放。
//!
//! ## 模块
//! - `landmarks`: 33 点姿态数组到 12 关节骨架的解码

pub mod landmarks;

use chrono::{DateTime, Utc};
use rep_motion::coaching::payload::new_session_id;
use rep_motion::coaching::{CoachingRequest, SessionAnalyzer, SessionRecord};
use rep_motion::motion::types::{FrameInput, FrameOutcome, PoseKeypoints, RepSummary};
use rep_motion::motion::{ExerciseKind, MotionConfig, MotionEngine};
use wasm_bindgen::prelude::*;

/// 与 JS 无关的会话状态，便于在原生目标下测试
pub struct Session {
    session_id: String,
    engine: MotionEngine,
    reps: Vec<RepSummary>,
}

impl Session {
    pub fn new(exercise: ExerciseKind, session_id: Option<String>) -> Self {
        Self {
            session_id: session_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(new_session_id),
            engine: MotionEngine::new(MotionConfig::for_exercise(exercise)),
            reps: Vec::new(),
        }
    }

    /// 图像关键点不完整时返回 None；世界坐标不完整时退化为仅 2D
    pub fn process(
        &mut self,
        landmarks: &[f64],
        confidence: f64,
        world_landmarks: Option<&[f64]>,
    ) -> Option<FrameOutcome> {
        let image = landmarks::decode_image(landmarks)?;
        let world = world_landmarks.and_then(landmarks::decode_world);
        let input = FrameInput::new(PoseKeypoints::from_parts(image, world), confidence);

        let outcome = self.engine.process_frame(&input);
        if let Some(rep) = &outcome.rep {
            self.reps.push(rep.clone());
        }
        Some(outcome)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.reps.clear();
    }

    pub fn rep_count(&self) -> u32 {
        self.engine.rep_count()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn coaching_request(&self, record: SessionRecord) -> CoachingRequest {
        let report = SessionAnalyzer::new().analyze(&record, &[]);
        CoachingRequest::from_reps(self.session_id.clone(), &self.reps).with_report(&report)
    }

    /// wasm32 下没有系统时钟，时间戳由 JS 侧 `Date.now()` 提供
    pub fn record(&self, recorded_at_ms: i64) -> SessionRecord {
        SessionRecord {
            session_id: self.session_id.clone(),
            exercise: self.engine.exercise(),
            recorded_at: DateTime::<Utc>::from_timestamp_millis(recorded_at_ms).unwrap_or_default(),
            reps: self.reps.clone(),
        }
    }
}

/// 单次会话的动作分析器
#[wasm_bindgen]
pub struct MotionAnalyzer {
    session: Session,
}

#[wasm_bindgen]
impl MotionAnalyzer {
    /// 创建分析器
    ///
    /// # 参数
    /// - `exercise`: "squat" 或 "push_up"（也接受 "pushup" / "push-up"）
    /// - `session_id`: 可选，未提供时生成 UUID
    #[wasm_bindgen(constructor)]
    pub fn new(exercise: &str, session_id: Option<String>) -> Result<MotionAnalyzer, JsError> {
        let kind: ExerciseKind = exercise.parse().map_err(|e: String| JsError::new(&e))?;
        Ok(Self {
            session: Session::new(kind, session_id),
        })
    }

    /// 处理一帧
    ///
    /// # 参数
    /// - `landmarks`: 33 × 2 图像坐标
    /// - `confidence`: 检测置信度 (0.0-1.0)
    /// - `world_landmarks`: 可选，33 × 3 世界坐标
    ///
    /// # 返回
    /// `{ frame, liveChecks, rep }`；关键点不完整时为 null
    #[wasm_bindgen(js_name = "processFrame")]
    pub fn process_frame(
        &mut self,
        landmarks: &[f64],
        confidence: f64,
        world_landmarks: Option<Vec<f64>>,
    ) -> JsValue {
        match self
            .session
            .process(landmarks, confidence, world_landmarks.as_deref())
        {
            Some(outcome) => serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = "reset")]
    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = "getRepCount")]
    pub fn get_rep_count(&self) -> u32 {
        self.session.rep_count()
    }

    #[wasm_bindgen(js_name = "getSessionId")]
    pub fn get_session_id(&self) -> String {
        self.session.session_id().to_string()
    }

    /// 当前会话的教练请求负载（含整组汇总）
    #[wasm_bindgen(js_name = "coachingRequest")]
    pub fn coaching_request(&self) -> JsValue {
        let record = self.session.record(js_sys::Date::now() as i64);
        let request = self.session.coaching_request(record);
        serde_wasm_bindgen::to_value(&request).unwrap_or(JsValue::NULL)
    }
}
