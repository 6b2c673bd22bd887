pub(crate) mod bezier;
pub(crate) mod keyframe;
