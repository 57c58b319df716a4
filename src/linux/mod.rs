pub mod chage;
