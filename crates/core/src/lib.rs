//! Core library: embeddings, vector indexes, classification, retrieval and
//! grounded conversation.

pub mod chatlog;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod embeddings;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod search;
pub mod service;
pub mod vectorstore;
