//! ポインタ制御
//!
//! 顔のモーションベクトルを画面上のポインタ座標へ変換する。
//! カメラの物理回転・鏡像の補正、デッドゾーン、感度、加速を
//! この順に適用し、結果を画面境界にクランプする。

use tracing::debug;

use crate::domain::config::{PointerConfig, ScreenConfig};
use crate::domain::types::{CameraFlip, PointF};

/// モーションベクトル→ポインタ座標の変換器
///
/// キャプチャスレッド専用（共有されない）。
pub struct PointerControl {
    config: PointerConfig,
    screen_width: f32,
    screen_height: f32,
    rotation_degrees: u32,
    flip: CameraFlip,
    location: PointF,
    enabled: bool,
}

impl PointerControl {
    pub fn new(
        config: &PointerConfig,
        screen: &ScreenConfig,
        rotation_degrees: u32,
        flip: CameraFlip,
    ) -> Self {
        let mut control = Self {
            config: config.clone(),
            screen_width: screen.width as f32,
            screen_height: screen.height as f32,
            rotation_degrees,
            flip,
            location: PointF::default(),
            enabled: true,
        };
        control.reset();
        control
    }

    /// ポインタを画面中央へ戻す
    pub fn reset(&mut self) {
        self.location = PointF::new(self.screen_width / 2.0, self.screen_height / 2.0);
    }

    /// ポインタ移動の有効/無効を切り替える
    ///
    /// 無効中はモーションを無視し、ポインタは現在位置に留まる。
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "Pointer motion toggled");
        }
        self.enabled = enabled;
    }

    /// 現在のポインタ位置
    pub fn location(&self) -> PointF {
        self.location
    }

    /// モーションベクトルを適用し、新しいポインタ位置を返す
    pub fn update_motion(&mut self, dx: f32, dy: f32) -> PointF {
        if !self.enabled {
            return self.location;
        }

        // 1. センサーの物理回転を補正（カメラ座標系→画面座標系）
        let (mut dx, dy) = match self.rotation_degrees {
            90 => (dy, -dx),
            180 => (-dx, -dy),
            270 => (-dy, dx),
            _ => (dx, dy),
        };

        // 2. 鏡像補正: 前面カメラは左右反転して見えるため、
        //    頭を右へ動かしたらポインタも右へ動くようX成分を反転する
        match self.flip {
            CameraFlip::Horizontal => dx = -dx,
            CameraFlip::None | CameraFlip::Vertical => {}
        }

        // 3. デッドゾーン: 微細な揺れによるドリフトを無視
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude < self.config.motion_threshold_px {
            return self.location;
        }

        // 4. 感度と加速
        let mut gain = self.config.sensitivity;
        if magnitude > self.config.acceleration_threshold_px {
            gain *= self.config.acceleration;
        }

        // 5. 移動して画面境界にクランプ
        self.location = PointF::new(
            (self.location.x + dx * gain).clamp(0.0, self.screen_width - 1.0),
            (self.location.y + dy * gain).clamp(0.0, self.screen_height - 1.0),
        );
        self.location
    }
}
