use crate::pose::Landmark;

/// 関節が見つからない・ベクトル長0のときの角度（伸展扱い）
pub const EXTENDED_ANGLE_DEG: f32 = 180.0;

/// 正規化座標でのユークリッド距離
pub fn distance(p: &Landmark, q: &Landmark) -> f32 {
    (p.x - q.x).hypot(p.y - q.y)
}

/// b を頂点とする a-b-c の角度（度）
///
/// どちらかのベクトルが長さ0なら 180° を返す。
pub fn joint_angle_degrees(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);
    let denom = ba.0.hypot(ba.1) * bc.0.hypot(bc.1);
    if denom == 0.0 {
        return EXTENDED_ANGLE_DEG;
    }
    let cos = ((ba.0 * bc.0 + ba.1 * bc.1) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
