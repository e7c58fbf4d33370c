pub mod frame;
pub mod landmark;

pub use frame::{FrameError, LandmarkFrame};
pub use landmark::{
    face, hand, FaceLandmarks, HandLandmarks, Handedness, Landmark, PoseIndex, PoseLandmarks, Side,
};
