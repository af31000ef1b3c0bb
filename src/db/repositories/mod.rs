pub mod storage_repository;
