//! 역할 기반 접근 제어.
//!
//! 스토어프런트 사용자 역할 및 권한 정의.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 토큰 페이로드의 `data.role` 필드에 소문자 문자열로 실립니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 일반 고객
    Customer,
    /// 디럭스 회원 - 파생 디럭스 토큰으로 증명되는 상위 등급
    Deluxe,
    /// 회계 담당 - 전체 주문 조회 및 배송 상태 변경
    Accounting,
    /// 관리자 - 모든 권한 보유
    Admin,
}

impl Role {
    /// 역할이 특정 권한을 가지는지 확인.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Accounting => matches!(
                permission,
                Permission::PlaceOrders
                    | Permission::WriteReviews
                    | Permission::ViewAllOrders
                    | Permission::ToggleDeliveryStatus
            ),
            Role::Deluxe => matches!(
                permission,
                Permission::PlaceOrders | Permission::WriteReviews | Permission::DeluxeOffers
            ),
            Role::Customer => matches!(
                permission,
                Permission::PlaceOrders | Permission::WriteReviews
            ),
        }
    }

    /// 이 역할이 가진 권한 목록.
    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.has_permission(*p))
            .collect()
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Role::Customer),
            "deluxe" => Some(Role::Deluxe),
            "accounting" => Some(Role::Accounting),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Deluxe => "deluxe",
            Role::Accounting => "accounting",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 시스템 권한.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// 주문 생성
    PlaceOrders,
    /// 상품 리뷰 작성
    WriteReviews,
    /// 디럭스 전용 상품/할인
    DeluxeOffers,
    /// 전체 주문 조회
    ViewAllOrders,
    /// 배송 상태 변경
    ToggleDeliveryStatus,
    /// 사용자 관리
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::PlaceOrders,
        Permission::WriteReviews,
        Permission::DeluxeOffers,
        Permission::ViewAllOrders,
        Permission::ToggleDeliveryStatus,
        Permission::ManageUsers,
    ];

    /// 권한에 대한 설명 반환.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::PlaceOrders => "주문 생성",
            Permission::WriteReviews => "리뷰 작성",
            Permission::DeluxeOffers => "디럭스 혜택",
            Permission::ViewAllOrders => "전체 주문 조회",
            Permission::ToggleDeliveryStatus => "배송 상태 변경",
            Permission::ManageUsers => "사용자 관리",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.has_permission(Permission::ManageUsers));
        assert!(Role::Admin.has_permission(Permission::DeluxeOffers));

        assert!(Role::Accounting.has_permission(Permission::ViewAllOrders));
        assert!(Role::Accounting.has_permission(Permission::ToggleDeliveryStatus));
        assert!(!Role::Accounting.has_permission(Permission::DeluxeOffers));

        assert!(Role::Deluxe.has_permission(Permission::DeluxeOffers));
        assert!(!Role::Deluxe.has_permission(Permission::ViewAllOrders));

        assert!(Role::Customer.has_permission(Permission::PlaceOrders));
        assert!(!Role::Customer.has_permission(Permission::DeluxeOffers));
        assert!(!Role::Customer.has_permission(Permission::ManageUsers));
    }

    #[test]
    fn test_permission_lists() {
        assert_eq!(Role::Admin.permissions().len(), Permission::ALL.len());
        assert_eq!(
            Role::Customer.permissions(),
            vec![Permission::PlaceOrders, Permission::WriteReviews]
        );
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("DELUXE"), Some(Role::Deluxe));
        assert_eq!(Role::parse("Accounting"), Some(Role::Accounting));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Deluxe).unwrap();
        assert_eq!(json, "\"deluxe\"");

        let parsed: Role = serde_json::from_str("\"accounting\"").unwrap();
        assert_eq!(parsed, Role::Accounting);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }
}
