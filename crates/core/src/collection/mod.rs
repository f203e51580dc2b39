pub mod face_collection_client;
