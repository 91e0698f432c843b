pub mod audio_session;
