//! Interactive fireworks: a rocket and particle simulation, a fading-trail
//! renderer and a terminal show that ties them to mouse and keyboard input.

pub mod canvas;
pub mod color;
pub mod effects;
pub mod recipe;
pub mod render;
pub mod sim;
