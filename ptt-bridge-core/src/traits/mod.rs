pub mod audio_output;
pub mod profile;
pub mod radio;
