mod chunking;
mod helpers;
mod sessions;
